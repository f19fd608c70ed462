pub mod error;
pub mod host;
pub mod input;
pub mod machine;

pub use error::FlowError;
pub use machine::{
    LoginFlow, LoginOutcome, MfaContext, MfaMethod, PasskeyOutcome, SendOutcome, Step, Tenant,
    VerifyOutcome, RESEND_COOLDOWN_SECONDS,
};
