//! HTTP client for the identity service.
//!
//! One `reqwest` client built at startup with the crate user-agent; all
//! endpoints are JSON POSTs. Domain errors come back in the response
//! envelope and convert into flow outcomes; transport failures bubble as
//! errors for the caller to surface as the generic retryable condition.

pub mod types;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::flow::{LoginOutcome, MfaMethod, PasskeyOutcome, SendOutcome, Tenant, VerifyOutcome};
use crate::APP_USER_AGENT;
use types::{
    DirectLoginRequest, DirectLoginResponse, MfaSendRequest, MfaSendResponse, MfaVerifyRequest,
    MfaVerifyResponse, PasskeyRequest, PasskeyResponse, TenantLookupRequest, TenantLookupResponse,
};

const LOOKUP_PATH: &str = "/v1/auth/lookup";
const LOGIN_PATH: &str = "/v1/auth/login";
const MFA_SEND_PATH: &str = "/v1/auth/mfa/send";
const MFA_VERIFY_PATH: &str = "/v1/auth/mfa/verify";
const PASSKEY_PATH: &str = "/v1/auth/passkey";

pub struct IdentityClient {
    http: Client,
    base: Url,
}

impl IdentityClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).context("invalid identity API URL")?;
        if base.host_str().is_none() {
            return Err(anyhow!("identity API URL has no host"));
        }
        let http = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("invalid endpoint path {path}"))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        debug!("{url} - {status}");

        // Domain errors ride on non-2xx statuses with the same envelope, so
        // the body is parsed regardless of status.
        response
            .json::<T>()
            .await
            .with_context(|| format!("{url} - {status}: invalid response body"))
    }

    /// Map an email to the tenants it belongs to. Empty means unknown
    /// account; the caller shows the same generic error either way.
    #[instrument(skip(self))]
    pub async fn lookup_tenants(&self, email: &str) -> Result<Vec<Tenant>> {
        let response: TenantLookupResponse = self
            .post_json(LOOKUP_PATH, &TenantLookupRequest { email })
            .await?;
        Ok(response.into_tenants())
    }

    /// Validate the password for a tenant. May require MFA.
    #[instrument(skip(self, password))]
    pub async fn direct_login(
        &self,
        email: &str,
        password: &SecretString,
        tenant_slug: &str,
        remember_me: bool,
        device_id: Uuid,
    ) -> Result<LoginOutcome> {
        let request = DirectLoginRequest {
            email,
            password: password.expose_secret(),
            tenant_slug,
            remember_me,
            device_id,
        };
        let response: DirectLoginResponse = self.post_json(LOGIN_PATH, &request).await?;
        Ok(response.into_outcome())
    }

    /// Send (or resend) an emailed verification code for the MFA session.
    #[instrument(skip(self, session))]
    pub async fn send_mfa_code(&self, session: &str, method: MfaMethod) -> Result<SendOutcome> {
        let request = MfaSendRequest {
            mfa_session: session,
            method,
        };
        let response: MfaSendResponse = self.post_json(MFA_SEND_PATH, &request).await?;
        Ok(response.into_outcome())
    }

    /// Verify a six-digit MFA code, optionally trusting this device.
    #[instrument(skip(self, session, code))]
    pub async fn verify_mfa(
        &self,
        session: &str,
        code: &str,
        method: MfaMethod,
        trust_device: bool,
    ) -> Result<VerifyOutcome> {
        let request = MfaVerifyRequest {
            mfa_session: session,
            code,
            method,
            trust_device,
        };
        let response: MfaVerifyResponse = self.post_json(MFA_VERIFY_PATH, &request).await?;
        Ok(response.into_outcome())
    }

    /// Passkey side entry, bypassing password and MFA.
    #[instrument(skip(self))]
    pub async fn authenticate_with_passkey(
        &self,
        email: &str,
        device_id: Uuid,
    ) -> Result<PasskeyOutcome> {
        let request = PasskeyRequest { email, device_id };
        let response: PasskeyResponse = self.post_json(PASSKEY_PATH, &request).await?;
        Ok(response.into_outcome())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_against_the_base() {
        let client = IdentityClient::new("https://api.backoffice.example.com").unwrap();
        let url = client.endpoint(LOGIN_PATH).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.backoffice.example.com/v1/auth/login"
        );
    }

    #[test]
    fn endpoint_replaces_base_paths() {
        let client = IdentityClient::new("https://api.backoffice.example.com/old/").unwrap();
        let url = client.endpoint(MFA_SEND_PATH).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.backoffice.example.com/v1/auth/mfa/send"
        );
    }

    #[test]
    fn new_rejects_invalid_urls() {
        assert!(IdentityClient::new("not a url").is_err());
        assert!(IdentityClient::new("unix:/run/identity.sock").is_err());
    }
}
