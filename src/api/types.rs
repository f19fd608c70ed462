//! Request/response types for the identity service.
//!
//! Responses carry a `success` flag plus an optional machine-readable
//! `error` code; domain errors ride on the same JSON envelope regardless of
//! HTTP status. Each response converts into the flow outcome it represents,
//! so the state machine never touches wire shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow::{
    FlowError, LoginOutcome, MfaMethod, PasskeyOutcome, SendOutcome, Tenant, VerifyOutcome,
};

/// Machine-readable error codes the identity service emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum ApiErrorCode {
    #[serde(rename = "ACCOUNT_LOCKED")]
    AccountLocked,
    #[serde(rename = "RATE_LIMITED")]
    RateLimited,
    #[serde(rename = "INVALID_MFA_SESSION")]
    InvalidMfaSession,
    #[serde(rename = "INVALID_CREDENTIALS")]
    InvalidCredentials,
    #[serde(rename = "INVALID_CODE")]
    InvalidCode,
    #[serde(rename = "CANCELLED")]
    Cancelled,
    /// Forward compatibility: unknown codes degrade to the generic error.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize)]
pub struct TenantLookupRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct TenantList {
    #[serde(default)]
    pub tenants: Vec<Tenant>,
}

#[derive(Debug, Deserialize)]
pub struct TenantLookupResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<TenantList>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TenantLookupResponse {
    /// Tenants for the account; empty means unknown account (the flow shows
    /// the same generic error either way).
    #[must_use]
    pub fn into_tenants(self) -> Vec<Tenant> {
        if !self.success {
            return Vec::new();
        }
        self.data.map(|data| data.tenants).unwrap_or_default()
    }
}

// Debug deliberately not derived: the password crosses here in the clear.
#[derive(Serialize)]
pub struct DirectLoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub tenant_slug: &'a str,
    pub remember_me: bool,
    pub device_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DirectLoginResponse {
    pub success: bool,
    #[serde(default)]
    pub mfa_required: bool,
    #[serde(default)]
    pub mfa_session: Option<String>,
    #[serde(default)]
    pub mfa_methods: Vec<MfaMethod>,
    #[serde(default)]
    pub error: Option<ApiErrorCode>,
    #[serde(default)]
    pub locked_until: Option<u64>,
    #[serde(default)]
    pub retry_after: Option<u64>,
    #[serde(default)]
    pub remaining_attempts: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DirectLoginResponse {
    #[must_use]
    pub fn into_outcome(self) -> LoginOutcome {
        if self.success {
            if self.mfa_required {
                return match self.mfa_session {
                    Some(session) => LoginOutcome::MfaRequired {
                        session,
                        methods: self.mfa_methods,
                    },
                    // MFA required without a session token is a malformed
                    // response; the user can only retry.
                    None => LoginOutcome::Rejected(FlowError::Unavailable {
                        message: self.message,
                    }),
                };
            }
            return LoginOutcome::Success;
        }
        LoginOutcome::Rejected(match self.error {
            Some(ApiErrorCode::AccountLocked) => FlowError::AccountLocked {
                locked_until: self.locked_until.unwrap_or(0),
            },
            Some(ApiErrorCode::RateLimited) => FlowError::RateLimited {
                retry_after: self.retry_after.unwrap_or(0),
            },
            Some(ApiErrorCode::InvalidCredentials) | None => FlowError::InvalidCredentials {
                remaining_attempts: self.remaining_attempts,
            },
            Some(_) => FlowError::Unavailable {
                message: self.message,
            },
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MfaSendRequest<'a> {
    pub mfa_session: &'a str,
    pub method: MfaMethod,
}

#[derive(Debug, Deserialize)]
pub struct MfaSendResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<ApiErrorCode>,
    #[serde(default)]
    pub retry_after: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MfaSendResponse {
    #[must_use]
    pub fn into_outcome(self) -> SendOutcome {
        if self.success {
            return SendOutcome::Sent;
        }
        match self.error {
            Some(ApiErrorCode::InvalidMfaSession) => SendOutcome::SessionExpired,
            Some(ApiErrorCode::RateLimited) => SendOutcome::Failed(FlowError::RateLimited {
                retry_after: self.retry_after.unwrap_or(0),
            }),
            _ => SendOutcome::Failed(FlowError::Unavailable {
                message: self.message,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MfaVerifyRequest<'a> {
    pub mfa_session: &'a str,
    pub code: &'a str,
    pub method: MfaMethod,
    pub trust_device: bool,
}

#[derive(Debug, Deserialize)]
pub struct MfaVerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<ApiErrorCode>,
    #[serde(default)]
    pub remaining_attempts: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MfaVerifyResponse {
    #[must_use]
    pub fn into_outcome(self) -> VerifyOutcome {
        if self.success {
            return VerifyOutcome::Verified;
        }
        match self.error {
            Some(ApiErrorCode::InvalidMfaSession) => VerifyOutcome::SessionExpired,
            Some(ApiErrorCode::InvalidCode) | None => {
                VerifyOutcome::Rejected(FlowError::InvalidCode {
                    remaining_attempts: self.remaining_attempts,
                })
            }
            _ => VerifyOutcome::Rejected(FlowError::Unavailable {
                message: self.message,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PasskeyRequest<'a> {
    pub email: &'a str,
    pub device_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PasskeyResponse {
    pub success: bool,
    /// Tenant resolved from the credential; present on success.
    #[serde(default)]
    pub tenant: Option<Tenant>,
    #[serde(default)]
    pub error: Option<ApiErrorCode>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PasskeyResponse {
    #[must_use]
    pub fn into_outcome(self) -> PasskeyOutcome {
        if self.success {
            return match self.tenant {
                Some(tenant) => PasskeyOutcome::Authenticated { tenant },
                None => PasskeyOutcome::Failed(FlowError::Unavailable {
                    message: self.message,
                }),
            };
        }
        match self.error {
            Some(ApiErrorCode::Cancelled) => PasskeyOutcome::Cancelled,
            _ => PasskeyOutcome::Failed(FlowError::Unavailable {
                message: self.message,
            }),
        }
    }
}
