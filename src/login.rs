//! Login orchestration.
//!
//! Flow Overview:
//! 1) Admission through the attempt throttle (also for unknown usernames).
//! 2) Identity lookup; unknown usernames look exactly like wrong passwords.
//! 3) Active locks reject the attempt before the password is looked at.
//! 4) Password digest comparison; a mismatch feeds the lockout counter.
//! 5) On success both counters are cleared and a session token is issued.
//!
//! The lockout is reported from the attempt after the one that triggers it; the
//! triggering attempt still gets the generic invalid-credentials message.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    config::AuthConfig,
    error::LoginError,
    password,
    store::{CredentialStore, MemoryStore},
    throttle::AttemptThrottle,
    token::{SessionClaims, TokenAuthority},
};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";

/// A successful authentication.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Boolean-success view of a login, as handed to callers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Result<Session, LoginError>> for LoginResult {
    fn from(outcome: Result<Session, LoginError>) -> Self {
        match outcome {
            Ok(session) => Self {
                success: true,
                token: Some(session.token),
                user_id: Some(session.username),
                message: LOGIN_SUCCESS_MESSAGE.to_string(),
                expires_at: Some(session.expires_at),
            },
            Err(err) => Self {
                success: false,
                token: None,
                user_id: None,
                message: err.to_string(),
                expires_at: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LogoutResult {
    pub success: bool,
}

pub struct LoginService {
    store: Arc<dyn CredentialStore>,
    throttle: Arc<AttemptThrottle>,
    tokens: Arc<TokenAuthority>,
    clock: Arc<dyn Clock>,
    // Serializes the read-modify-write sequence of a login across store and throttle.
    gate: Mutex<()>,
}

impl LoginService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        throttle: Arc<AttemptThrottle>,
        tokens: Arc<TokenAuthority>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            throttle,
            tokens,
            clock,
            gate: Mutex::new(()),
        }
    }

    /// Service over the demo accounts, wired to the given clock.
    #[must_use]
    pub fn with_sample_identities(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(MemoryStore::with_sample_identities(config, clock.clone()));
        let throttle = Arc::new(AttemptThrottle::from_config(config, clock.clone()));
        let tokens = Arc::new(TokenAuthority::new(config, clock.clone()));
        Self::new(store, throttle, tokens, clock)
    }

    /// Demo accounts on the wall clock.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::with_sample_identities(config, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenAuthority> {
        &self.tokens
    }

    #[must_use]
    pub fn throttle(&self) -> &Arc<AttemptThrottle> {
        &self.throttle
    }

    /// Run the login state machine.
    ///
    /// # Errors
    ///
    /// Returns the first failing step as a [`LoginError`].
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Session, LoginError> {
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());

        if !self.throttle.allow(username) {
            debug!("Login for {username} rejected by the attempt throttle");
            return Err(LoginError::RateLimited);
        }

        let Some(identity) = self.store.lookup(username) else {
            debug!("Login for unknown username {username}");
            return Err(LoginError::InvalidCredentials);
        };

        let now = self.clock.now();
        if let Some(remaining) = identity.lock_remaining(now) {
            let minutes = remaining.num_milliseconds().saturating_add(59_999) / 60_000;
            debug!("Login for {username} rejected: locked for {minutes} more minutes");
            return Err(LoginError::AccountLocked { minutes });
        }

        if password::digest(password) != identity.password_digest {
            self.store.record_failure(username);
            debug!("Wrong password for {username}");
            return Err(LoginError::InvalidCredentials);
        }

        self.store.record_success(username);
        self.throttle.reset(username);

        let issued = self
            .tokens
            .issue(username, &identity.role)
            .map_err(LoginError::Internal)?;

        info!("Login succeeded for {username}");

        Ok(Session {
            token: issued.token,
            username: identity.username,
            expires_at: issued.expires_at,
        })
    }

    /// Login in the boolean-success shape. Internal failures are logged and
    /// collapsed into a generic message.
    pub fn login(&self, username: &str, password: &str) -> LoginResult {
        let outcome = self.authenticate(username, password);
        if let Err(LoginError::Internal(err)) = &outcome {
            error!("Login failed for {username}: {err}");
        }
        outcome.into()
    }

    pub fn logout(&self, token: &str) -> LogoutResult {
        self.tokens.revoke(token);
        LogoutResult { success: true }
    }

    /// Claims of a valid token. Why a token was rejected only shows up in logs.
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        match self.tokens.verify(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                warn!("Rejected session token: {err}");
                None
            }
        }
    }
}
