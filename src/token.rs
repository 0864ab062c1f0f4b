//! Session tokens: HS256 JWTs signed with the configured secret, plus the
//! revocation set consulted before any signature work.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::{clock::Clock, config::AuthConfig, error::TokenError};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_ID_BYTES: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried by a session token. Timestamps are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub username: String,
    pub role: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "jti")]
    pub token_id: String,
}

impl SessionClaims {
    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

/// Only the expiry is needed to know how long a revocation entry must be kept.
#[derive(Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenAuthority {
    secret: SecretString,
    issuer: String,
    ttl_seconds: i64,
    // digest(token) -> unix second after which the entry is no longer needed
    revoked: Mutex<HashMap<Vec<u8>, i64>>,
    clock: Arc<dyn Clock>,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn token_digest(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_token_id() -> Result<String, TokenError> {
    let mut bytes = [0u8; TOKEN_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| TokenError::TokenId)?;
    Ok(hex::encode(bytes))
}

fn split_token(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    if parts.next().is_some() {
        return Err(TokenError::TokenFormat);
    }
    Ok((header_b64, claims_b64, sig_b64))
}

impl TokenAuthority {
    #[must_use]
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        if config.uses_default_secret() {
            warn!("Signing session tokens with the default secret; set PORTERO_JWT_SECRET");
        }
        Self {
            secret: config.jwt_secret().clone(),
            issuer: config.issuer().to_string(),
            ttl_seconds: config.token_ttl_seconds(),
            revoked: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }

    /// Issue a token for `username` valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidTtl` if the configured TTL is not positive or
    /// pushes the expiry out of range.
    pub fn issue(&self, username: &str, role: &str) -> Result<IssuedToken, TokenError> {
        let ttl = Duration::try_seconds(self.ttl_seconds).ok_or(TokenError::InvalidTtl)?;
        self.issue_with_ttl(username, role, ttl)
    }

    /// Issue a token with an explicit TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the TTL is invalid, a token id cannot be generated
    /// or the claims cannot be encoded.
    pub fn issue_with_ttl(
        &self,
        username: &str,
        role: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidTtl);
        }
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::InvalidTtl)?;

        let claims = SessionClaims {
            username: username.to_string(),
            role: role.to_string(),
            issued_at: now.timestamp(),
            expires_at: expires_at.timestamp(),
            issuer: self.issuer.clone(),
            token_id: generate_token_id()?,
        };

        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature_b64}"),
            claims,
            expires_at,
        })
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token was revoked, is malformed, uses another
    /// algorithm, carries a bad signature or issuer, or has expired.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        // Revocation wins over everything else, checked before any crypto.
        if self.is_revoked(token) {
            return Err(TokenError::Revoked);
        }

        let (header_b64, claims_b64, sig_b64) = split_token(token)?;

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.issuer != self.issuer {
            return Err(TokenError::InvalidIssuer);
        }
        if claims.expires_at <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Deny `token` from now on. Revoking twice, or revoking garbage, is fine.
    pub fn revoke(&self, token: &str) {
        let now = self.clock.now().timestamp();
        // Undecodable tokens never verify; keep them for one TTL all the same.
        let keep_until = split_token(token)
            .and_then(|(_, claims_b64, _)| b64d_json::<ExpiryOnly>(claims_b64))
            .map_or_else(|_| now.saturating_add(self.ttl_seconds), |c| c.exp);

        let mut revoked = self.revoked.lock().unwrap_or_else(|e| e.into_inner());
        revoked.retain(|_, until| *until > now);
        revoked.insert(token_digest(token), keep_until);
    }

    #[must_use]
    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&token_digest(token))
    }

    /// Drop revocation entries for tokens that have expired on their own.
    pub fn sweep(&self) {
        let now = self.clock.now().timestamp();
        let mut revoked = self.revoked.lock().unwrap_or_else(|e| e.into_inner());
        let before = revoked.len();
        revoked.retain(|_, until| *until > now);
        let swept = before - revoked.len();
        if swept > 0 {
            debug!("Swept {swept} expired revocation entries");
        }
    }

    #[must_use]
    pub fn revoked_count(&self) -> usize {
        self.revoked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Start a background task that sweeps the revocation set every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_sweep_task(
        self: &Arc<Self>,
        interval: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let authority = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            loop {
                interval_timer.tick().await;
                authority.sweep();
            }
        })
    }
}
