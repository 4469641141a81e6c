//! Password Service
//!
//! Argon2id hashing and verification. Only the PHC-format hash is ever
//! stored or logged; plaintext passwords stay on the stack.

use argon2::{
    password_hash::{
        rand_core::OsRng,
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use tracing::{debug, warn};

use crate::shared::error::{PlatformError, Result};
use crate::shared::validate;

/// Argon2id cost configuration
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism
    pub parallelism: u32,
    /// Output hash length in bytes
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Low-memory config for tests.
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096, // 4 MiB
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Params {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .expect("Invalid Argon2 params")
    }
}

pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(config: Argon2Config) -> Self {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, config.to_params());
        Self { argon2 }
    }

    /// Hash a password using Argon2id with a fresh random salt. The
    /// password is validated against the schema rules first.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        validate::validate_password(password)?;

        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PlatformError::internal(format!("Failed to hash password: {}", e)))?;

        debug!("Password hashed");
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash. A mismatch is `Ok(false)`;
    /// only a malformed hash or backend failure is an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PlatformError::internal(format!("Invalid password hash format: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                warn!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => Err(PlatformError::internal(format!(
                "Password verification error: {}",
                e
            ))),
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(Argon2Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(Argon2Config::testing())
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let service = service();
        let hash = service.hash_password("secret123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify_password("secret123", &hash).unwrap());
        assert!(!service.verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let service = service();
        let hash1 = service.hash_password("secret123").unwrap();
        let hash2 = service.hash_password("secret123").unwrap();

        // Random salt per hash
        assert_ne!(hash1, hash2);
        assert!(service.verify_password("secret123", &hash1).unwrap());
        assert!(service.verify_password("secret123", &hash2).unwrap());
    }

    #[test]
    fn short_password_is_rejected_before_hashing() {
        let err = service().hash_password("short").unwrap_err();
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn garbage_hash_is_an_internal_error() {
        assert!(service().verify_password("whatever", "not-a-phc-hash").is_err());
    }
}
