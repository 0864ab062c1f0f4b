use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::config::AuthConfig;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_MAX_FAILED_ATTEMPTS: &str = "max-failed-attempts";
pub const ARG_LOCK_DURATION_SECONDS: &str = "lock-duration-seconds";
pub const ARG_RATE_LIMIT_WINDOW_SECONDS: &str = "rate-limit-window-seconds";
pub const ARG_RATE_LIMIT_MAX_ATTEMPTS: &str = "rate-limit-max-attempts";

// A year is plenty for any window or lock and keeps timestamp arithmetic in range.
const MAX_DURATION_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Options {
    pub jwt_secret: Option<SecretString>,
    pub token_ttl_seconds: i64,
    pub max_failed_attempts: u32,
    pub lock_duration_seconds: i64,
    pub rate_limit_window_seconds: i64,
    pub rate_limit_max_attempts: u32,
}

impl Options {
    /// Parse authentication arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a value is missing despite its default.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get = |id: &str| -> anyhow::Result<i64> {
            matches
                .get_one::<i64>(id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };
        let get_u32 = |id: &str| -> anyhow::Result<u32> {
            matches
                .get_one::<u32>(id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            jwt_secret: matches
                .get_one::<String>(ARG_JWT_SECRET)
                .filter(|v| !v.trim().is_empty())
                .map(|v| SecretString::from(v.as_str())),
            token_ttl_seconds: get(ARG_TOKEN_TTL_SECONDS)?,
            max_failed_attempts: get_u32(ARG_MAX_FAILED_ATTEMPTS)?,
            lock_duration_seconds: get(ARG_LOCK_DURATION_SECONDS)?,
            rate_limit_window_seconds: get(ARG_RATE_LIMIT_WINDOW_SECONDS)?,
            rate_limit_max_attempts: get_u32(ARG_RATE_LIMIT_MAX_ATTEMPTS)?,
        })
    }

    #[must_use]
    pub fn into_config(self) -> AuthConfig {
        let config = match self.jwt_secret {
            Some(secret) => AuthConfig::new(secret),
            None => AuthConfig::default(),
        };
        config
            .with_token_ttl_seconds(self.token_ttl_seconds)
            .with_max_failed_attempts(self.max_failed_attempts)
            .with_lock_duration_seconds(self.lock_duration_seconds)
            .with_rate_limit_window_seconds(self.rate_limit_window_seconds)
            .with_rate_limit_max_attempts(
                usize::try_from(self.rate_limit_max_attempts).unwrap_or(usize::MAX),
            )
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign session tokens (HS256)")
                .long_help(
                    "Secret used to sign session tokens (HS256).\n\nWhen unset a well-known placeholder is used; every deployment must override it.",
                )
                .env("PORTERO_JWT_SECRET")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("PORTERO_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64))
                .global(true),
        )
        .arg(
            Arg::new(ARG_MAX_FAILED_ATTEMPTS)
                .long(ARG_MAX_FAILED_ATTEMPTS)
                .help("Failed passwords before an account is locked")
                .env("PORTERO_MAX_FAILED_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..))
                .global(true),
        )
        .arg(
            Arg::new(ARG_LOCK_DURATION_SECONDS)
                .long(ARG_LOCK_DURATION_SECONDS)
                .help("Account lock duration in seconds")
                .env("PORTERO_LOCK_DURATION_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_DURATION_SECONDS))
                .global(true),
        )
        .arg(
            Arg::new(ARG_RATE_LIMIT_WINDOW_SECONDS)
                .long(ARG_RATE_LIMIT_WINDOW_SECONDS)
                .help("Sliding window for login attempts in seconds")
                .env("PORTERO_RATE_LIMIT_WINDOW_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_DURATION_SECONDS))
                .global(true),
        )
        .arg(
            Arg::new(ARG_RATE_LIMIT_MAX_ATTEMPTS)
                .long(ARG_RATE_LIMIT_MAX_ATTEMPTS)
                .help("Login attempts allowed per username within the window")
                .env("PORTERO_RATE_LIMIT_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..))
                .global(true),
        )
}
