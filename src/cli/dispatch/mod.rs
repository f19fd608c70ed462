use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::store::LogoutReason;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let mut globals = GlobalArgs::new(
        matches
            .get_one::<String>("state-dir")
            .map(PathBuf::from)
            .unwrap_or_else(default_state_dir),
    );
    globals.console_host = matches.get_one::<String>("host").map(String::from);
    globals.base_domain = matches.get_one::<String>("base-domain").map(String::from);

    if matches.subcommand_matches("logout").is_some() {
        return Ok((Action::Logout, globals));
    }

    let action = Action::Login {
        api_url: matches
            .get_one("api-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --api-url"))?,
        remember_me: matches.get_flag("remember-me"),
        trust_device: matches.get_flag("trust-device"),
        reason: matches
            .get_one::<String>("reason")
            .map(|reason| match reason.as_str() {
                "unauthorized" => LogoutReason::Unauthorized,
                _ => LogoutReason::SessionExpired,
            }),
    };

    Ok((action, globals))
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || std::env::temp_dir().join("eniri"),
        |home| Path::new(&home).join(".config").join("eniri"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn login_action_carries_flags_and_reason() {
        temp_env::with_vars([("ENIRI_STATE_DIR", None::<String>)], || {
            let matches = commands::new().get_matches_from(vec![
                "eniri",
                "--api-url",
                "https://api.backoffice.example.com",
                "--trust-device",
                "--reason",
                "session_expired",
            ]);
            let (action, _globals) = handler(&matches).unwrap();
            match action {
                Action::Login {
                    api_url,
                    remember_me,
                    trust_device,
                    reason,
                } => {
                    assert_eq!(api_url, "https://api.backoffice.example.com");
                    assert!(!remember_me);
                    assert!(trust_device);
                    assert_eq!(reason, Some(LogoutReason::SessionExpired));
                }
                Action::Logout => panic!("expected login action"),
            }
        });
    }

    #[test]
    fn logout_subcommand_maps_to_logout_action() {
        temp_env::with_vars([("ENIRI_API_URL", None::<String>)], || {
            let matches = commands::new().get_matches_from(vec!["eniri", "logout"]);
            let (action, _globals) = handler(&matches).unwrap();
            assert!(matches!(action, Action::Logout));
        });
    }

    #[test]
    fn state_dir_argument_overrides_the_default() {
        temp_env::with_vars([("ENIRI_STATE_DIR", None::<String>)], || {
            let matches = commands::new().get_matches_from(vec![
                "eniri",
                "--api-url",
                "https://api.backoffice.example.com",
                "--state-dir",
                "/tmp/eniri-test",
            ]);
            let (_action, globals) = handler(&matches).unwrap();
            assert_eq!(globals.state_dir, PathBuf::from("/tmp/eniri-test"));
        });
    }

    #[test]
    fn default_state_dir_is_under_home_when_set() {
        temp_env::with_vars([("HOME", Some("/home/clerk"))], || {
            assert_eq!(
                default_state_dir(),
                PathBuf::from("/home/clerk/.config/eniri")
            );
        });
    }
}
