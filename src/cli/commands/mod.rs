use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        PossibleValuesParser, ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("eniri")
        .about("Multi-tenant back-office sign-in")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_negates_reqs(true)
        .arg(
            Arg::new("api-url")
                .short('a')
                .long("api-url")
                .help("Identity service base URL, example: https://api.backoffice.example.com")
                .env("ENIRI_API_URL")
                .required(true),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Console hostname; a tenant subdomain here skips store selection")
                .env("ENIRI_HOST"),
        )
        .arg(
            Arg::new("base-domain")
                .long("base-domain")
                .help("Platform base domain, example: backoffice.example.com")
                .env("ENIRI_BASE_DOMAIN"),
        )
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .help("Directory for preferences and sign-out notices")
                .env("ENIRI_STATE_DIR"),
        )
        .arg(
            Arg::new("remember-me")
                .long("remember-me")
                .help("Ask the server for a long-lived session")
                .env("ENIRI_REMEMBER_ME")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("trust-device")
                .long("trust-device")
                .help("Ask the server to skip MFA on this device for a while")
                .env("ENIRI_TRUST_DEVICE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("reason")
                .long("reason")
                .help("Why the previous session ended, shown as a sign-in banner")
                .value_parser(PossibleValuesParser::new(["unauthorized", "session_expired"])),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("ENIRI_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(Command::new("logout").about("Record a signed-out notice for the next sign-in"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "eniri");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Multi-tenant back-office sign-in"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_api_url_and_flags() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "eniri",
            "--api-url",
            "https://api.backoffice.example.com",
            "--host",
            "acme.backoffice.example.com",
            "--base-domain",
            "backoffice.example.com",
            "--remember-me",
        ]);

        assert_eq!(
            matches.get_one::<String>("api-url").map(|s| s.to_string()),
            Some("https://api.backoffice.example.com".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("host").map(|s| s.to_string()),
            Some("acme.backoffice.example.com".to_string())
        );
        assert_eq!(
            matches
                .get_one::<String>("base-domain")
                .map(|s| s.to_string()),
            Some("backoffice.example.com".to_string())
        );
        assert!(matches.get_flag("remember-me"));
        assert!(!matches.get_flag("trust-device"));
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("ENIRI_API_URL", Some("https://api.backoffice.example.com")),
                ("ENIRI_HOST", Some("acme.backoffice.example.com")),
                ("ENIRI_STATE_DIR", Some("/tmp/eniri-state")),
                ("ENIRI_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["eniri"]);
                assert_eq!(
                    matches.get_one::<String>("api-url").map(|s| s.to_string()),
                    Some("https://api.backoffice.example.com".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("host").map(|s| s.to_string()),
                    Some("acme.backoffice.example.com".to_string())
                );
                assert_eq!(
                    matches
                        .get_one::<String>("state-dir")
                        .map(|s| s.to_string()),
                    Some("/tmp/eniri-state".to_string())
                );
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("ENIRI_LOG_LEVEL", Some(level)),
                    ("ENIRI_API_URL", Some("https://api.backoffice.example.com")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["eniri"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").map(|s| *s),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("ENIRI_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "eniri".to_string(),
                    "--api-url".to_string(),
                    "https://api.backoffice.example.com".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }

    #[test]
    fn test_logout_subcommand_needs_no_api_url() {
        temp_env::with_vars([("ENIRI_API_URL", None::<String>)], || {
            let command = new();
            let matches = command.try_get_matches_from(vec!["eniri", "logout"]);
            assert!(matches.is_ok());
        });
    }

    #[test]
    fn test_reason_rejects_unknown_values() {
        temp_env::with_vars(
            [("ENIRI_API_URL", Some("https://api.backoffice.example.com"))],
            || {
                let command = new();
                let matches = command.try_get_matches_from(vec!["eniri", "--reason", "because"]);
                assert!(matches.is_err());
            },
        );
    }
}
