pub mod login;
pub mod logout;

use crate::store::LogoutReason;

#[derive(Debug, Clone)]
pub enum Action {
    Login {
        api_url: String,
        remember_me: bool,
        trust_device: bool,
        reason: Option<LogoutReason>,
    },
    Logout,
}
