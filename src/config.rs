//! Authentication settings and their defaults.

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_JWT_SECRET: &str = "your-secret-key";
pub const DEFAULT_ISSUER: &str = "medical-ocr-system";
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCK_DURATION_SECONDS: i64 = 15 * 60;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: i64 = 15 * 60;
pub const DEFAULT_RATE_LIMIT_MAX_ATTEMPTS: usize = 5;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    issuer: String,
    token_ttl_seconds: i64,
    max_failed_attempts: u32,
    lock_duration_seconds: i64,
    rate_limit_window_seconds: i64,
    rate_limit_max_attempts: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::from(DEFAULT_JWT_SECRET),
            issuer: DEFAULT_ISSUER.to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lock_duration_seconds: DEFAULT_LOCK_DURATION_SECONDS,
            rate_limit_window_seconds: DEFAULT_RATE_LIMIT_WINDOW_SECONDS,
            rate_limit_max_attempts: DEFAULT_RATE_LIMIT_MAX_ATTEMPTS,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: String) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_failed_attempts(mut self, attempts: u32) -> Self {
        self.max_failed_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_lock_duration_seconds(mut self, seconds: i64) -> Self {
        self.lock_duration_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_rate_limit_window_seconds(mut self, seconds: i64) -> Self {
        self.rate_limit_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_rate_limit_max_attempts(mut self, attempts: usize) -> Self {
        self.rate_limit_max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    /// True while the signing secret is still the shipped placeholder.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret.expose_secret() == DEFAULT_JWT_SECRET
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Raw TTL; the token authority rejects values that are not positive or overflow.
    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }

    #[must_use]
    pub fn lock_duration(&self) -> Duration {
        seconds_or_zero(self.lock_duration_seconds)
    }

    #[must_use]
    pub fn rate_limit_window(&self) -> Duration {
        seconds_or_zero(self.rate_limit_window_seconds)
    }

    #[must_use]
    pub fn rate_limit_max_attempts(&self) -> usize {
        self.rate_limit_max_attempts
    }
}

fn seconds_or_zero(seconds: i64) -> Duration {
    Duration::try_seconds(seconds).unwrap_or_else(Duration::zero)
}
