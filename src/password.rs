//! Password digest used for credential comparison.
//!
//! Unsalted SHA-256, hex encoded. Kept for compatibility with existing digests;
//! it is not a password hashing scheme anyone should pick for new deployments.

use sha2::{Digest, Sha256};

#[must_use]
pub fn digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
