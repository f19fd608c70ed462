//! Sign-in flow state machine.
//!
//! Flow Overview:
//! 1) Email lookup resolves the tenants an account belongs to.
//! 2) One tenant (or a console-subdomain match) skips selection; several
//!    tenants require an explicit pick.
//! 3) Password login either completes or escalates to MFA with a
//!    server-issued session token.
//! 4) MFA verification (TOTP or emailed code) completes the flow.
//!
//! The machine is pure: the CLI driver issues the network calls and feeds the
//! outcomes back in. Each step variant carries exactly the data that must
//! exist at that step, so an `mfa` step without a session token cannot be
//! constructed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::FlowError;

/// Local advisory countdown between emailed-code sends. The server enforces
/// the real rate limit.
pub const RESEND_COOLDOWN_SECONDS: u64 = 60;

/// A store/business instance on the platform, identified by a slug that
/// doubles as its console subdomain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Second-factor delivery method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MfaMethod {
    Totp,
    Email,
}

impl MfaMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Totp => "totp",
            Self::Email => "email",
        }
    }
}

/// Verification context held while the flow sits at the MFA step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MfaContext {
    session: String,
    methods: Vec<MfaMethod>,
    active: MfaMethod,
    resend_cooldown: u64,
}

impl MfaContext {
    /// Opaque server-issued token correlating this verification with the
    /// password login that required it.
    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    #[must_use]
    pub fn methods(&self) -> &[MfaMethod] {
        &self.methods
    }

    #[must_use]
    pub fn active(&self) -> MfaMethod {
        self.active
    }

    /// Seconds until another emailed code may be requested.
    #[must_use]
    pub fn resend_cooldown(&self) -> u64 {
        self.resend_cooldown
    }
}

/// Current step of the flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Email,
    TenantSelect,
    Password { tenant: Tenant },
    Mfa { tenant: Tenant, mfa: MfaContext },
    Success { tenant: Tenant },
}

/// Outcome of a password login call.
#[derive(Clone, Debug)]
pub enum LoginOutcome {
    Success,
    MfaRequired {
        session: String,
        methods: Vec<MfaMethod>,
    },
    Rejected(FlowError),
}

/// Outcome of an emailed-code send or resend.
#[derive(Clone, Debug)]
pub enum SendOutcome {
    Sent,
    SessionExpired,
    Failed(FlowError),
}

/// Outcome of an MFA code verification.
#[derive(Clone, Debug)]
pub enum VerifyOutcome {
    Verified,
    SessionExpired,
    Rejected(FlowError),
}

/// Outcome of the passkey side entry.
#[derive(Clone, Debug)]
pub enum PasskeyOutcome {
    Authenticated { tenant: Tenant },
    Cancelled,
    Failed(FlowError),
}

/// The sign-in flow: current step plus the ephemeral session draft. Created
/// when the login starts and discarded after the success redirect.
#[derive(Clone, Debug)]
pub struct LoginFlow {
    email: String,
    tenants: Vec<Tenant>,
    remember_me: bool,
    trust_device: bool,
    error: Option<FlowError>,
    step: Step,
}

impl LoginFlow {
    #[must_use]
    pub fn new(remember_me: bool, trust_device: bool) -> Self {
        Self {
            email: String::new(),
            tenants: Vec::new(),
            remember_me,
            trust_device,
            error: None,
            step: Step::Email,
        }
    }

    #[must_use]
    pub fn step(&self) -> &Step {
        &self.step
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Tenants returned by the email lookup. Empty before the lookup and
    /// after navigating back to the email step.
    #[must_use]
    pub fn tenants(&self) -> &[Tenant] {
        &self.tenants
    }

    #[must_use]
    pub fn remember_me(&self) -> bool {
        self.remember_me
    }

    #[must_use]
    pub fn trust_device(&self) -> bool {
        self.trust_device
    }

    pub fn set_trust_device(&mut self, trust_device: bool) {
        self.trust_device = trust_device;
    }

    /// Error to surface inline on the current step, if any.
    #[must_use]
    pub fn error(&self) -> Option<&FlowError> {
        self.error.as_ref()
    }

    /// Surface a flow-external condition on the current step: a boot-time
    /// notice (forced logout, expired session) or a transport failure from a
    /// call whose outcome never arrived. Cleared like any other step-local
    /// error on the next action.
    pub fn set_notice(&mut self, notice: FlowError) {
        self.error = Some(notice);
    }

    /// Apply the result of the email lookup.
    ///
    /// `subdomain` is the tenant slug encoded in the console hostname, when
    /// there is one. A matching subdomain skips the selection step; a
    /// mismatch refuses to proceed so the user is never signed into a tenant
    /// context they did not ask for.
    pub fn apply_lookup(&mut self, email: String, tenants: Vec<Tenant>, subdomain: Option<&str>) {
        if !matches!(self.step, Step::Email) {
            return;
        }
        self.error = None;
        self.email = email;
        self.tenants.clear();

        if tenants.is_empty() {
            self.error = Some(FlowError::AccountNotFound);
            return;
        }

        if let Some(subdomain) = subdomain {
            match tenants.iter().find(|tenant| tenant.slug == subdomain) {
                Some(tenant) => {
                    let tenant = tenant.clone();
                    self.tenants = tenants;
                    self.step = Step::Password { tenant };
                }
                None => {
                    self.error = Some(FlowError::TenantAccessDenied);
                }
            }
            return;
        }

        if tenants.len() == 1 {
            let tenant = tenants[0].clone();
            self.tenants = tenants;
            self.step = Step::Password { tenant };
        } else {
            self.tenants = tenants;
            self.step = Step::TenantSelect;
        }
    }

    /// Pick a tenant by index into [`Self::tenants`]. Returns `false` when
    /// not at the selection step or the index is out of range.
    pub fn select_tenant(&mut self, index: usize) -> bool {
        if !matches!(self.step, Step::TenantSelect) {
            return false;
        }
        let Some(tenant) = self.tenants.get(index).cloned() else {
            return false;
        };
        self.error = None;
        self.step = Step::Password { tenant };
        true
    }

    /// Apply the result of a password login.
    ///
    /// Returns `true` when the MFA step was entered with `email` as the
    /// active method, in which case the caller must issue the initial code
    /// send. TOTP never auto-sends.
    #[must_use]
    pub fn apply_login(&mut self, outcome: LoginOutcome) -> bool {
        let tenant = match &self.step {
            Step::Password { tenant } => tenant.clone(),
            _ => return false,
        };
        self.error = None;
        match outcome {
            LoginOutcome::Success => {
                self.step = Step::Success { tenant };
                false
            }
            LoginOutcome::MfaRequired { session, methods } => {
                // A response naming no methods still requires a second
                // factor; emailed codes are the lowest common denominator.
                let methods = if methods.is_empty() {
                    vec![MfaMethod::Email]
                } else {
                    methods
                };
                let active = if methods.contains(&MfaMethod::Totp) {
                    MfaMethod::Totp
                } else {
                    MfaMethod::Email
                };
                self.step = Step::Mfa {
                    tenant,
                    mfa: MfaContext {
                        session,
                        methods,
                        active,
                        resend_cooldown: 0,
                    },
                };
                active == MfaMethod::Email
            }
            LoginOutcome::Rejected(error) => {
                self.error = Some(error);
                false
            }
        }
    }

    /// Apply the result of an emailed-code send.
    pub fn apply_send(&mut self, outcome: SendOutcome) {
        let Step::Mfa { tenant, mfa } = &mut self.step else {
            return;
        };
        match outcome {
            SendOutcome::Sent => {
                self.error = None;
                mfa.resend_cooldown = RESEND_COOLDOWN_SECONDS;
            }
            SendOutcome::SessionExpired => {
                let tenant = tenant.clone();
                self.error = Some(FlowError::MfaSessionExpired);
                self.step = Step::Password { tenant };
            }
            SendOutcome::Failed(error) => {
                // A server retry-after is authoritative over the local countdown.
                if let FlowError::RateLimited { retry_after } = &error {
                    mfa.resend_cooldown = *retry_after;
                }
                self.error = Some(error);
            }
        }
    }

    /// Switch the active MFA method. Selecting the already-active method or
    /// one the account does not have is a no-op. Returns `true` when the
    /// switch requires a fresh emailed code.
    #[must_use]
    pub fn switch_method(&mut self, method: MfaMethod) -> bool {
        let Step::Mfa { mfa, .. } = &mut self.step else {
            return false;
        };
        if mfa.active == method || !mfa.methods.contains(&method) {
            return false;
        }
        mfa.active = method;
        self.error = None;
        method == MfaMethod::Email
    }

    /// Whether a resend may be issued: emailed-code method active and the
    /// cooldown elapsed.
    #[must_use]
    pub fn can_resend(&self) -> bool {
        matches!(
            &self.step,
            Step::Mfa { mfa, .. }
                if mfa.active == MfaMethod::Email && mfa.resend_cooldown == 0
        )
    }

    /// Apply the result of an MFA code verification.
    pub fn apply_verify(&mut self, outcome: VerifyOutcome) {
        let Step::Mfa { tenant, .. } = &self.step else {
            return;
        };
        let tenant = tenant.clone();
        match outcome {
            VerifyOutcome::Verified => {
                self.error = None;
                self.step = Step::Success { tenant };
            }
            VerifyOutcome::SessionExpired => {
                // The MFA session and any entered code die with the context.
                self.error = Some(FlowError::MfaSessionExpired);
                self.step = Step::Password { tenant };
            }
            VerifyOutcome::Rejected(error) => {
                self.error = Some(error);
            }
        }
    }

    /// Apply the result of the passkey side entry. Only meaningful at the
    /// email step; success bypasses tenant selection, password and MFA.
    /// User cancellation is silent.
    pub fn apply_passkey(&mut self, outcome: PasskeyOutcome) {
        if !matches!(self.step, Step::Email) {
            return;
        }
        match outcome {
            PasskeyOutcome::Authenticated { tenant } => {
                self.error = None;
                self.step = Step::Success { tenant };
            }
            PasskeyOutcome::Cancelled => {}
            PasskeyOutcome::Failed(error) => {
                self.error = Some(error);
            }
        }
    }

    /// Navigate one step back, clearing step-local error state.
    ///
    /// From `password`: to tenant selection when the lookup found several
    /// tenants, otherwise to the email step with the lookup cleared. From
    /// `mfa`: to `password`, dropping the session, code and cooldown.
    pub fn back(&mut self) {
        self.error = None;
        self.step = match std::mem::replace(&mut self.step, Step::Email) {
            Step::Email => Step::Email,
            Step::TenantSelect => {
                self.tenants.clear();
                Step::Email
            }
            Step::Password { .. } => {
                if self.tenants.len() > 1 {
                    Step::TenantSelect
                } else {
                    self.tenants.clear();
                    Step::Email
                }
            }
            Step::Mfa { tenant, .. } => Step::Password { tenant },
            // Terminal; the redirect is already scheduled.
            step @ Step::Success { .. } => step,
        };
    }

    /// Advance the resend cooldown by one second. Only ticks while the MFA
    /// step is active with the emailed-code method; never goes negative.
    pub fn tick(&mut self) {
        if let Step::Mfa { mfa, .. } = &mut self.step {
            if mfa.active == MfaMethod::Email {
                mfa.resend_cooldown = mfa.resend_cooldown.saturating_sub(1);
            }
        }
    }
}
