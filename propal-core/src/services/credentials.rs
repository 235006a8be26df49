//! Credential hashing - Argon2id password storage
//!
//! New credentials are stored as PHC strings (`$argon2id$v=19$...`). Records
//! created before hashing was introduced still hold plain text; those are
//! recognized and compared directly so existing users can sign in.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::config::PasswordHashing;
use crate::domain::result::{Error, Result};

/// Outcome of checking a password against a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Matched an Argon2 hash
    Verified,
    /// Matched a plain-text legacy credential
    LegacyMatch,
    Rejected,
}

impl Verification {
    pub fn is_match(&self) -> bool {
        !matches!(self, Verification::Rejected)
    }
}

/// Hashes and verifies stored credentials
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    /// Hash of a random secret, verified against when no stored credential
    /// is available so a miss costs the same as a wrong password
    decoy: String,
}

impl CredentialHasher {
    pub fn new(settings: &PasswordHashing) -> Result<Self> {
        let params = Params::new(
            settings.memory_cost,
            settings.time_cost,
            settings.parallelism,
            None,
        )
        .map_err(|e| Error::Other(format!("Invalid password hashing parameters: {}", e)))?;

        let mut hasher = Self {
            params,
            decoy: String::new(),
        };
        hasher.decoy = hasher.hash(SaltString::generate(&mut OsRng).as_str())?;
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Other(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Check `password` against a stored credential
    ///
    /// Hash parameters are read from the PHC string, so credentials hashed
    /// under older settings keep verifying after a config change.
    ///
    /// A credential that only looks like a PHC string but does not parse as
    /// one is treated as legacy plain text.
    pub fn verify(&self, password: &str, stored: &str) -> Verification {
        if let Some(parsed) = parse_hash(stored) {
            return match self.argon2().verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Verification::Verified,
                Err(_) => Verification::Rejected,
            };
        }

        if constant_time_eq(stored.as_bytes(), password.as_bytes()) {
            Verification::LegacyMatch
        } else {
            Verification::Rejected
        }
    }

    /// Spend one full verification on a password that has nothing to match
    pub fn verify_decoy(&self, password: &str) {
        let _ = self.verify(password, &self.decoy);
    }
}

/// Whether a stored credential is an Argon2 PHC string
pub fn is_hashed(stored: &str) -> bool {
    parse_hash(stored).is_some()
}

fn parse_hash(stored: &str) -> Option<PasswordHash<'_>> {
    if !stored.starts_with("$argon2") {
        return None;
    }
    PasswordHash::new(stored).ok()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(&PasswordHashing {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_is_phc_and_salted() {
        let hasher = hasher();
        let first = hasher.hash("pw1").unwrap();
        let second = hasher.hash("pw1").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert!(is_hashed(&first));
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_hashed() {
        let hasher = hasher();
        let stored = hasher.hash("pw1").unwrap();

        assert_eq!(hasher.verify("pw1", &stored), Verification::Verified);
        assert_eq!(hasher.verify("wrong", &stored), Verification::Rejected);
    }

    #[test]
    fn test_verify_legacy_plain_text() {
        let hasher = hasher();
        assert_eq!(hasher.verify("hunter2", "hunter2"), Verification::LegacyMatch);
        assert_eq!(hasher.verify("hunter", "hunter2"), Verification::Rejected);
        assert!(!hasher.verify("", "hunter2").is_match());
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        let hasher = hasher();
        assert_eq!(
            hasher.verify("pw", "$argon2id$garbage"),
            Verification::Rejected
        );
    }

    #[test]
    fn test_plain_text_resembling_a_hash_still_matches() {
        let hasher = hasher();
        let stored = "$argon2-was-my-password";

        assert!(!is_hashed(stored));
        assert_eq!(hasher.verify(stored, stored), Verification::LegacyMatch);
        assert_eq!(hasher.verify("other", stored), Verification::Rejected);
    }

    #[test]
    fn test_decoy_is_a_real_hash() {
        let hasher = hasher();
        assert!(is_hashed(&hasher.decoy));
        assert_eq!(hasher.verify("", &hasher.decoy), Verification::Rejected);
    }

    #[test]
    fn test_verifies_hash_made_with_other_params() {
        let stronger = CredentialHasher::new(&PasswordHashing {
            memory_cost: 2048,
            time_cost: 2,
            parallelism: 1,
        })
        .unwrap();
        let stored = stronger.hash("pw1").unwrap();
        assert_eq!(hasher().verify("pw1", &stored), Verification::Verified);
    }

    #[test]
    fn test_invalid_params() {
        let result = CredentialHasher::new(&PasswordHashing {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(Error::Other(_))));
    }
}
