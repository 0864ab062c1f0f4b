pub mod auth;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const CMD_LOGIN: &str = "login";
pub const CMD_VERIFY: &str = "verify";
pub const CMD_SHELL: &str = "shell";

pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_TOKEN: &str = "token";
pub const ARG_SWEEP_INTERVAL_SECONDS: &str = "sweep-interval-seconds";

fn login_command() -> Command {
    Command::new(CMD_LOGIN)
        .about("Authenticate once and print the login result as JSON")
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long(ARG_USERNAME)
                .help("Username to authenticate")
                .env("PORTERO_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .short('p')
                .long(ARG_PASSWORD)
                .help("Password to authenticate with")
                .env("PORTERO_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}

fn verify_command() -> Command {
    Command::new(CMD_VERIFY)
        .about("Verify a session token and print its claims as JSON")
        .arg(
            Arg::new(ARG_TOKEN)
                .help("Session token to verify")
                .required(true),
        )
}

fn shell_command() -> Command {
    Command::new(CMD_SHELL)
        .about("Serve login, verify and logout requests read line by line from stdin")
        .long_about(
            "Serve requests read line by line from stdin, one JSON document per line on stdout.\n\nCommands:\n  login <username> <password>\n  verify <token>\n  logout <token>\n  quit",
        )
        .arg(
            Arg::new(ARG_SWEEP_INTERVAL_SECONDS)
                .long(ARG_SWEEP_INTERVAL_SECONDS)
                .help("Interval between sweeps of expired revocation entries")
                .env("PORTERO_SWEEP_INTERVAL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("portero")
        .about("Login gate: password authentication and session tokens")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(login_command())
        .subcommand(verify_command())
        .subcommand(shell_command());

    let command = auth::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "portero");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Login gate: password authentication and session tokens".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_login_args() {
        temp_env::with_vars([("PORTERO_PASSWORD", None::<&str>)], || {
            let matches = new().get_matches_from(vec![
                "portero", "login", "--username", "admin", "--password", "admin",
            ]);
            let sub = matches.subcommand_matches(CMD_LOGIN);
            assert_eq!(
                sub.and_then(|m| m.get_one::<String>(ARG_USERNAME))
                    .map(String::as_str),
                Some("admin")
            );
            assert_eq!(
                sub.and_then(|m| m.get_one::<String>(ARG_PASSWORD))
                    .map(String::as_str),
                Some("admin")
            );
        });
    }

    #[test]
    fn test_login_password_from_env() {
        temp_env::with_vars([("PORTERO_PASSWORD", Some("123"))], || {
            let matches = new().get_matches_from(vec!["portero", "login", "-u", "user1"]);
            assert_eq!(
                matches
                    .subcommand_matches(CMD_LOGIN)
                    .and_then(|m| m.get_one::<String>(ARG_PASSWORD))
                    .map(String::as_str),
                Some("123")
            );
        });
    }

    #[test]
    fn test_auth_defaults() {
        temp_env::with_vars(
            [
                ("PORTERO_JWT_SECRET", None::<&str>),
                ("PORTERO_TOKEN_TTL_SECONDS", None),
                ("PORTERO_MAX_FAILED_ATTEMPTS", None),
                ("PORTERO_LOCK_DURATION_SECONDS", None),
                ("PORTERO_RATE_LIMIT_WINDOW_SECONDS", None),
                ("PORTERO_RATE_LIMIT_MAX_ATTEMPTS", None),
            ],
            || {
                let matches = new().get_matches_from(vec!["portero", "verify", "abc"]);
                let options = auth::Options::parse(&matches);
                assert!(options.is_ok());
                let Ok(options) = options else { return };

                assert!(options.jwt_secret.is_none());
                assert_eq!(options.token_ttl_seconds, 86_400);
                assert_eq!(options.max_failed_attempts, 5);
                assert_eq!(options.lock_duration_seconds, 900);
                assert_eq!(options.rate_limit_window_seconds, 900);
                assert_eq!(options.rate_limit_max_attempts, 5);
                assert!(options.into_config().uses_default_secret());
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("PORTERO_JWT_SECRET", Some("from-env")),
                ("PORTERO_TOKEN_TTL_SECONDS", Some("3600")),
                ("PORTERO_MAX_FAILED_ATTEMPTS", Some("3")),
                ("PORTERO_LOCK_DURATION_SECONDS", Some("60")),
                ("PORTERO_RATE_LIMIT_WINDOW_SECONDS", Some("120")),
                ("PORTERO_RATE_LIMIT_MAX_ATTEMPTS", Some("10")),
                ("PORTERO_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["portero", "shell"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );

                let config = auth::Options::parse(&matches).map(auth::Options::into_config);
                assert!(config.is_ok());
                let Ok(config) = config else { return };
                assert_eq!(config.jwt_secret().expose_secret(), "from-env");
                assert_eq!(config.token_ttl_seconds(), 3600);
                assert_eq!(config.max_failed_attempts(), 3);
                assert_eq!(config.lock_duration(), chrono::Duration::seconds(60));
                assert_eq!(config.rate_limit_window(), chrono::Duration::seconds(120));
                assert_eq!(config.rate_limit_max_attempts(), 10);
            },
        );
    }

    #[test]
    fn test_rejects_zero_limits() {
        temp_env::with_vars([("PORTERO_RATE_LIMIT_MAX_ATTEMPTS", None::<&str>)], || {
            let result = new().try_get_matches_from(vec![
                "portero",
                "--rate-limit-max-attempts",
                "0",
                "shell",
            ]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("PORTERO_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["portero", "shell"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5_usize {
            temp_env::with_vars([("PORTERO_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["portero".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }
                args.push("shell".to_string());

                let matches = new().get_matches_from(args);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
