//! Interactive sign-in driver.
//!
//! One prompt per flow step; every submit issues exactly one request and
//! feeds the outcome back into the state machine, so there is never more
//! than one in-flight call. The resend cooldown ticks on a one-second
//! interval while the MFA prompt waits for input; both it and the redirect
//! delay die with the task on teardown.

use crate::api::IdentityClient;
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::flow::{
    host::{host_of, tenant_subdomain},
    input::{normalize_email, valid_email, valid_mfa_code},
    FlowError, LoginFlow, LoginOutcome, MfaMethod, PasskeyOutcome, SendOutcome, Step, Tenant,
    VerifyOutcome,
};
use crate::store::{LogoutReason, Preferences, StateStore};
use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tokio::task;
use tokio::time::{interval, sleep};
use tracing::{debug, warn};

/// Pause between the success banner and emitting the console URL.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Handle the login action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let Action::Login {
        api_url,
        remember_me,
        trust_device,
        reason,
    } = action
    else {
        return Err(anyhow!("login handler invoked with a non-login action"));
    };

    let store = StateStore::open(&globals.state_dir)?;
    let mut preferences = store.load_preferences()?;
    let client = IdentityClient::new(&api_url)?;

    let subdomain = match (globals.console_host.as_deref(), globals.base_domain.as_deref()) {
        (Some(host), Some(base)) => match host_of(host) {
            Ok(host) => tenant_subdomain(&host, base),
            Err(err) => {
                warn!("ignoring console host: {err:#}");
                None
            }
        },
        _ => None,
    };
    if let Some(slug) = &subdomain {
        debug!("console subdomain: {slug}");
    }

    let mut flow = LoginFlow::new(remember_me, trust_device);
    let notice = match reason {
        Some(reason) => Some(reason),
        None => store.take_logout_notice()?,
    };
    if let Some(reason) = notice {
        flow.set_notice(notice_error(reason));
    }

    loop {
        if let Some(error) = flow.error() {
            println!("! {error}");
        }

        match flow.step().clone() {
            Step::Email => {
                let quit = email_step(
                    &client,
                    &mut flow,
                    &store,
                    &mut preferences,
                    subdomain.as_deref(),
                )
                .await?;
                if quit {
                    return Ok(());
                }
            }
            Step::TenantSelect => select_step(&mut flow).await?,
            Step::Password { tenant } => {
                password_step(&client, &mut flow, &tenant, preferences.device_id).await?;
            }
            Step::Mfa { .. } => mfa_step(&client, &mut flow).await?,
            Step::Success { tenant } => {
                if preferences.last_tenant.as_deref() != Some(tenant.slug.as_str()) {
                    preferences.last_tenant = Some(tenant.slug.clone());
                    store.save_preferences(&preferences)?;
                }
                println!("Signed in to {}", tenant.name);
                sleep(REDIRECT_DELAY).await;
                println!("Open {}", console_url(&tenant, globals, &api_url));
                return Ok(());
            }
        }
    }
}

/// Email prompt, with the passkey side entry. Returns `true` on quit.
async fn email_step(
    client: &IdentityClient,
    flow: &mut LoginFlow,
    store: &StateStore,
    preferences: &mut Preferences,
    subdomain: Option<&str>,
) -> Result<bool> {
    let default_email = preferences.last_email.clone();
    let prompt = match &default_email {
        Some(email) => format!("Email [{email}] ('p' passkey, 'q' quit): "),
        None => "Email ('p' passkey, 'q' quit): ".to_string(),
    };
    let input = prompt_line(&prompt).await?;

    match input.as_str() {
        "q" => return Ok(true),
        "p" => {
            let email = if flow.email().is_empty() {
                default_email
            } else {
                Some(flow.email().to_string())
            };
            let Some(email) = email else {
                println!("Enter your email before using a passkey");
                return Ok(false);
            };
            let outcome = match client
                .authenticate_with_passkey(&email, preferences.device_id)
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("passkey authentication failed: {err:#}");
                    PasskeyOutcome::Failed(FlowError::Unavailable { message: None })
                }
            };
            flow.apply_passkey(outcome);
        }
        _ => {
            let email = if input.is_empty() {
                default_email.unwrap_or_default()
            } else {
                input
            };
            let email = normalize_email(&email);
            if !valid_email(&email) {
                println!("Enter a valid email address");
                return Ok(false);
            }
            match client.lookup_tenants(&email).await {
                Ok(tenants) => flow.apply_lookup(email.clone(), tenants, subdomain),
                Err(err) => {
                    warn!("tenant lookup failed: {err:#}");
                    flow.set_notice(FlowError::Unavailable { message: None });
                    return Ok(false);
                }
            }
            if !matches!(flow.step(), Step::Email)
                && preferences.last_email.as_deref() != Some(email.as_str())
            {
                preferences.last_email = Some(email);
                store.save_preferences(preferences)?;
            }
        }
    }
    Ok(false)
}

async fn select_step(flow: &mut LoginFlow) -> Result<()> {
    println!("Select a store:");
    for (index, tenant) in flow.tenants().iter().enumerate() {
        println!("  {}) {} ({})", index + 1, tenant.name, tenant.slug);
    }
    let input = prompt_line("Store number ('b' back): ").await?;
    if input == "b" {
        flow.back();
        return Ok(());
    }
    match input.parse::<usize>() {
        Ok(n) if n >= 1 && flow.select_tenant(n - 1) => {}
        _ => println!("Enter a number between 1 and {}", flow.tenants().len()),
    }
    Ok(())
}

async fn password_step(
    client: &IdentityClient,
    flow: &mut LoginFlow,
    tenant: &Tenant,
    device_id: uuid::Uuid,
) -> Result<()> {
    let email = flow.email().to_string();
    let password = prompt_password(&format!(
        "Password for {email} at {} (empty to go back): ",
        tenant.name
    ))
    .await?;
    if password.is_empty() {
        flow.back();
        return Ok(());
    }
    let password = SecretString::from(password);

    let outcome = match client
        .direct_login(
            &email,
            &password,
            &tenant.slug,
            flow.remember_me(),
            device_id,
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("login request failed: {err:#}");
            LoginOutcome::Rejected(FlowError::Unavailable { message: None })
        }
    };

    if flow.apply_login(outcome) {
        send_code(client, flow).await;
    }
    Ok(())
}

async fn mfa_step(client: &IdentityClient, flow: &mut LoginFlow) -> Result<()> {
    let Some((_, active, cooldown)) = mfa_view(flow) else {
        return Ok(());
    };
    match active {
        MfaMethod::Totp => println!("Enter the code from your authenticator app"),
        MfaMethod::Email => {
            println!("Enter the code sent to {}", mask_email(flow.email()));
            if cooldown > 0 {
                println!("You can request another code in {cooldown}s");
            }
        }
    }

    let input = mfa_prompt(flow, "Code ('r' resend, 'm' method, 'b' back): ").await?;
    match input.as_str() {
        "b" => flow.back(),
        "r" => {
            let Some((_, active, cooldown)) = mfa_view(flow) else {
                return Ok(());
            };
            if flow.can_resend() {
                send_code(client, flow).await;
            } else if active == MfaMethod::Email {
                println!("Wait {cooldown}s before requesting another code");
            } else {
                println!("Resend applies to emailed codes; switch methods first");
            }
        }
        "m" => {
            let Some((_, active, _)) = mfa_view(flow) else {
                return Ok(());
            };
            let target = match active {
                MfaMethod::Totp => MfaMethod::Email,
                MfaMethod::Email => MfaMethod::Totp,
            };
            if flow.switch_method(target) {
                send_code(client, flow).await;
            } else if mfa_view(flow).map(|(_, active, _)| active) == Some(active) {
                println!("No other verification method is available");
            }
        }
        code => {
            if !valid_mfa_code(code) {
                println!("Codes are six digits");
                return Ok(());
            }
            let Some((session, method, _)) = mfa_view(flow) else {
                return Ok(());
            };
            let outcome = match client
                .verify_mfa(&session, code, method, flow.trust_device())
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("verification request failed: {err:#}");
                    VerifyOutcome::Rejected(FlowError::Unavailable { message: None })
                }
            };
            flow.apply_verify(outcome);
        }
    }
    Ok(())
}

/// Issue an emailed-code send for the current MFA session.
async fn send_code(client: &IdentityClient, flow: &mut LoginFlow) {
    let Some((session, _, _)) = mfa_view(flow) else {
        return;
    };
    let outcome = match client.send_mfa_code(&session, MfaMethod::Email).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("sending verification code failed: {err:#}");
            SendOutcome::Failed(FlowError::Unavailable { message: None })
        }
    };
    flow.apply_send(outcome);
}

fn mfa_view(flow: &LoginFlow) -> Option<(String, MfaMethod, u64)> {
    match flow.step() {
        Step::Mfa { mfa, .. } => Some((
            mfa.session().to_string(),
            mfa.active(),
            mfa.resend_cooldown(),
        )),
        _ => None,
    }
}

fn notice_error(reason: LogoutReason) -> FlowError {
    match reason {
        LogoutReason::Unauthorized => FlowError::Unauthorized,
        LogoutReason::SessionExpired => FlowError::SessionExpired,
        LogoutReason::LoggedOut => FlowError::LoggedOut,
    }
}

/// Console URL emitted after the redirect delay.
fn console_url(tenant: &Tenant, globals: &GlobalArgs, api_url: &str) -> String {
    match (&globals.base_domain, &globals.console_host) {
        (Some(base), _) => format!("https://{}.{base}", tenant.slug),
        (None, Some(host)) => format!("https://{host}"),
        (None, None) => api_url.to_string(),
    }
}

/// Hide most of the local part when echoing the code destination.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().unwrap_or('*');
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

fn read_prompted_line(prompt: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line.trim().to_string())
}

async fn prompt_line(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    Ok(task::spawn_blocking(move || read_prompted_line(&prompt)).await??)
}

async fn prompt_password(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    Ok(task::spawn_blocking(move || rpassword::prompt_password(prompt)).await??)
}

/// Read a line while ticking the resend cooldown once per second.
async fn mfa_prompt(flow: &mut LoginFlow, prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    let mut read = task::spawn_blocking(move || read_prompted_line(&prompt));
    let mut ticker = interval(Duration::from_secs(1));
    // The first tick completes immediately; consume it so the countdown
    // starts one second from now.
    ticker.tick().await;
    loop {
        tokio::select! {
            line = &mut read => return Ok(line??),
            _ = ticker.tick() => flow.tick(),
        }
    }
}
