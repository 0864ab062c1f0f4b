//! Credential store: known identities and their failure/lockout state.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::{clock::Clock, config::AuthConfig, password};

/// Demo accounts: username, SHA-256 of the password, role.
const SAMPLE_IDENTITIES: [(&str, &str, &str); 3] = [
    (
        "admin",
        "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918",
        "admin",
    ),
    (
        "user1",
        "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3",
        "user",
    ),
    (
        "doctor",
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        "doctor",
    ),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub password_digest: String,
    pub role: String,
    // Reserved; login does not consult it yet.
    pub active: bool,
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl Identity {
    #[must_use]
    pub fn new(username: &str, password_digest: &str, role: &str) -> Self {
        Self {
            username: username.to_string(),
            password_digest: password_digest.to_string(),
            role: role.to_string(),
            active: true,
            failed_attempts: 0,
            locked_until: None,
        }
    }

    /// Build an identity from a plaintext password.
    #[must_use]
    pub fn with_password(username: &str, password: &str, role: &str) -> Self {
        Self::new(username, &password::digest(password), role)
    }

    /// Time left on an active lock, `None` when the identity is not locked at `now`.
    #[must_use]
    pub fn lock_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }
}

pub trait CredentialStore: Send + Sync {
    /// Snapshot of the identity, `None` for unknown usernames.
    fn lookup(&self, username: &str) -> Option<Identity>;

    /// Count a failed password comparison and lock the identity once the limit is reached.
    fn record_failure(&self, username: &str);

    /// Clear the failure counter and any lock.
    fn record_success(&self, username: &str);
}

pub struct MemoryStore {
    identities: Mutex<HashMap<String, Identity>>,
    max_failed_attempts: u32,
    lock_duration: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            identities: Mutex::new(HashMap::new()),
            max_failed_attempts: config.max_failed_attempts(),
            lock_duration: config.lock_duration(),
            clock,
        }
    }

    /// Store seeded with the `admin`, `user1` and `doctor` demo accounts.
    #[must_use]
    pub fn with_sample_identities(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Self::new(config, clock);
        for (username, digest, role) in SAMPLE_IDENTITIES {
            store.insert(Identity::new(username, digest, role));
        }
        store
    }

    /// Add or replace an identity.
    pub fn insert(&self, identity: Identity) {
        let mut identities = self.identities.lock().unwrap_or_else(|e| e.into_inner());
        identities.insert(identity.username.clone(), identity);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.identities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryStore {
    fn lookup(&self, username: &str) -> Option<Identity> {
        let identities = self.identities.lock().unwrap_or_else(|e| e.into_inner());
        identities.get(username).cloned()
    }

    fn record_failure(&self, username: &str) {
        let mut identities = self.identities.lock().unwrap_or_else(|e| e.into_inner());
        let Some(identity) = identities.get_mut(username) else {
            return;
        };
        let now = self.clock.now();

        match identity.locked_until {
            // An active lock is never extended.
            Some(until) if until > now => {
                identity.failed_attempts = identity.failed_attempts.saturating_add(1);
                return;
            }
            // The previous lock ran out: this failure opens a new cycle.
            Some(_) => {
                identity.failed_attempts = 0;
                identity.locked_until = None;
            }
            None => {}
        }

        identity.failed_attempts = identity.failed_attempts.saturating_add(1);
        if identity.failed_attempts >= self.max_failed_attempts {
            // Locks too long to represent end at the latest instant chrono knows.
            let until = now
                .checked_add_signed(self.lock_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            identity.locked_until = Some(until);
            debug!(
                "Locking {username} after {} failed attempts",
                identity.failed_attempts
            );
        }
    }

    fn record_success(&self, username: &str) {
        let mut identities = self.identities.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(identity) = identities.get_mut(username) {
            identity.failed_attempts = 0;
            identity.locked_until = None;
        }
    }
}
