use thiserror::Error;

/// Why a token failed to issue or verify.
///
/// Callers of [`crate::LoginService::verify`] never see these variants; they
/// only show up in logs and in [`crate::TokenAuthority`] results.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("token expired")]
    Expired,
    #[error("token revoked")]
    Revoked,
    #[error("invalid token ttl")]
    InvalidTtl,
    #[error("failed to generate token id")]
    TokenId,
}

/// Outcome of a failed login. The `Display` text is what the caller gets to see.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Too many login attempts. Please wait a while and try again.")]
    RateLimited,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Account is locked. Try again in {minutes} minutes.")]
    AccountLocked { minutes: i64 },
    #[error("An error occurred during login")]
    Internal(#[source] TokenError),
}
