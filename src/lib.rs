//! # Portero (login gate)
//!
//! `portero` authenticates a username/password pair, issues a signed,
//! time-bounded session token and enforces abuse controls in front of a larger
//! application.
//!
//! ## Login Flow
//!
//! A login runs a strictly sequential state machine that stops at the first
//! failing step:
//!
//! 1. **Admission:** the [`throttle::AttemptThrottle`] counts attempts per username
//!    in a sliding window (5 attempts in 15 minutes by default).
//! 2. **Existence:** the [`store::CredentialStore`] looks up the identity.
//! 3. **Lockout:** identities with an active lock are rejected, even with the
//!    right password.
//! 4. **Password:** the SHA-256 digest of the password is compared with the stored
//!    digest. Failures feed the lockout counter (5 failures lock for 15 minutes).
//! 5. **Success:** counters are reset and the [`token::TokenAuthority`] signs an
//!    HS256 JWT valid for 24 hours.
//!
//! Unknown usernames and wrong passwords share one message so callers cannot
//! enumerate accounts.
//!
//! ## Revocation
//!
//! Logout adds the token to an in-memory denylist keyed by the token digest.
//! Entries are swept once the token would have expired anyway. State lives for
//! the process lifetime only.

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod login;
pub mod password;
pub mod store;
pub mod throttle;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use error::{LoginError, TokenError};
pub use login::{LoginResult, LoginService, LogoutResult, Session};
pub use store::{CredentialStore, Identity, MemoryStore};
pub use throttle::AttemptThrottle;
pub use token::{IssuedToken, SessionClaims, TokenAuthority};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
