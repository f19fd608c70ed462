//! User-facing error taxonomy for the sign-in flow.
//!
//! Every variant is recoverable: the user can resubmit the current step or
//! navigate back to the email step. Lockout and rate-limit countdowns are
//! display-only; the server enforces the real limits.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A condition surfaced inline on the current step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowError {
    /// No tenants were found for the email. The message stays generic to
    /// avoid account-existence disclosure.
    AccountNotFound,
    /// The console subdomain names a tenant the account has no access to.
    TenantAccessDenied,
    /// Password rejected, with the server's remaining-attempts counter.
    InvalidCredentials { remaining_attempts: Option<u32> },
    /// Account locked until the server-supplied unix timestamp.
    AccountLocked { locked_until: u64 },
    /// Too many requests; retry after the server-supplied number of seconds.
    RateLimited { retry_after: u64 },
    /// The MFA session timed out server-side; the password step must be redone.
    MfaSessionExpired,
    /// MFA code rejected, with the server's remaining-attempts counter.
    InvalidCode { remaining_attempts: Option<u32> },
    /// Transport failure or unrecognized server error; retryable.
    Unavailable { message: Option<String> },
    /// Boot notice: the console rejected an unauthenticated request.
    Unauthorized,
    /// Boot notice: the previous session expired.
    SessionExpired,
    /// Boot notice: the user was signed out.
    LoggedOut,
}

impl FlowError {
    /// Seconds left on a lockout, measured against the local clock.
    #[must_use]
    pub fn remaining_lock_seconds(&self) -> Option<u64> {
        match self {
            Self::AccountLocked { locked_until } => {
                Some(locked_until.saturating_sub(now_unix()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountNotFound => {
                write!(f, "We couldn't sign you in with that email address")
            }
            Self::TenantAccessDenied => {
                write!(f, "Your account does not have access to this store")
            }
            Self::InvalidCredentials {
                remaining_attempts: Some(n),
            } => write!(f, "Incorrect email or password ({n} attempts remaining)"),
            Self::InvalidCredentials { .. } => write!(f, "Incorrect email or password"),
            Self::AccountLocked { .. } => {
                let remaining = self.remaining_lock_seconds().unwrap_or(0);
                if remaining > 0 {
                    write!(
                        f,
                        "Account temporarily locked, try again in {} minutes",
                        remaining.div_ceil(60)
                    )
                } else {
                    write!(f, "Account temporarily locked, try again later")
                }
            }
            Self::RateLimited { retry_after } => {
                write!(f, "Too many attempts, try again in {retry_after} seconds")
            }
            Self::MfaSessionExpired => {
                write!(f, "Your verification session expired, enter your password again")
            }
            Self::InvalidCode {
                remaining_attempts: Some(n),
            } => write!(f, "Invalid verification code ({n} attempts remaining)"),
            Self::InvalidCode { .. } => write!(f, "Invalid verification code"),
            Self::Unavailable { message: Some(m) } => write!(f, "{m}"),
            Self::Unavailable { .. } => {
                write!(f, "Something went wrong, please try again")
            }
            Self::Unauthorized => write!(f, "Please sign in to continue"),
            Self::SessionExpired => write!(f, "Your session expired, sign in again"),
            Self::LoggedOut => write!(f, "You have been signed out"),
        }
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
