//! Argon2id hashing for passwords and refresh tokens.

use crate::config::AuthConfig;
use crate::error::AuthError;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Salted one-way hashing with a configurable cost
#[derive(Clone)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    /// Build a hasher from the Argon2 cost settings in `config`
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let params = Params::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| AuthError::Config(format!("Invalid Argon2 parameters: {e}")))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a secret with a fresh random salt
    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(secret.as_bytes(), &salt)?
            .to_string();

        Ok(hash)
    }

    /// Verify a secret against a stored hash
    ///
    /// The cost parameters embedded in `hash` win over the configured ones,
    /// so hashes survive cost changes.
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Stored hash is malformed: {:?}", e);
            AuthError::Internal
        })?;

        Ok(self
            .argon2()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
