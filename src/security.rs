//! Hooks into the security subsystem.
//!
//! The persistence layer only needs to turn a plaintext password into a
//! digest and to tell the token store that an existing database was found.
//! Token issuance and validation live elsewhere.

use sha2::{Digest, Sha256};

/// Capabilities consumed from the security subsystem.
pub trait SecurityHooks: Send + Sync + std::fmt::Debug {
    /// Returns the stored digest for `plaintext`.
    fn hash_password(&self, plaintext: &str) -> String;

    /// Called once when bootstrap finds an already-initialized database.
    fn load_tokens(&self);
}

/// Hex-encoded SHA-256 digests; token loading is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Security;

impl SecurityHooks for Sha256Security {
    fn hash_password(&self, plaintext: &str) -> String {
        let digest = Sha256::digest(plaintext.as_bytes());
        format!("{digest:x}")
    }

    fn load_tokens(&self) {
        tracing::debug!("no persisted tokens to load");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_digest_is_hex() {
        let digest = Sha256Security.hash_password("admin");
        assert_eq!(
            digest,
            "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let hooks = Sha256Security;
        assert_eq!(hooks.hash_password("pw"), hooks.hash_password("pw"));
        assert_ne!(hooks.hash_password("pw"), hooks.hash_password("PW"));
    }
}
