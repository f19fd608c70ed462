//! # Eniri (multi-tenant back-office sign-in client)
//!
//! `eniri` drives the multi-step sign-in flow of a multi-tenant e-commerce
//! back-office from the command line: email lookup, tenant selection,
//! password, multi-factor verification, success.
//!
//! ## Flow Model
//!
//! The flow is a finite state machine (`flow::LoginFlow`) over five steps:
//! `email → tenant-select → password → mfa → success`. The machine is pure;
//! it consumes the outcomes of identity-service calls issued by the CLI
//! driver and never performs I/O itself. Illegal states are unrepresentable:
//! the `mfa` step always carries its server-issued MFA session token, and the
//! `password`, `mfa` and `success` steps always carry the selected tenant.
//!
//! ## Tenant Auto-Selection
//!
//! When the console hostname encodes a tenant subdomain
//! (`acme.backoffice.example.com`), the selection step is skipped if and only
//! if that tenant is among the tenants returned for the email. A mismatch is
//! an access-denied error, never a silent sign-in into a different tenant.
//!
//! ## Server Authority
//!
//! Lockouts, rate limits and MFA session lifetimes are enforced by the
//! identity service. The client only reflects server-supplied countdowns
//! (`locked_until`, `retry_after`); the local resend cooldown is advisory.

pub mod api;
pub mod cli;
pub mod flow;
pub mod store;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
