//! Password hashing logics.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::ServerError;
use crate::config::Argon2 as ArgonConfig;

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> crate::error::Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| ServerError::Internal {
            details: format!("argon2 misconfigured: {err}"),
        })?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2 {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id.
    pub fn hash_password(
        &self,
        password: impl AsRef<[u8]>,
    ) -> crate::error::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|err| ServerError::Internal {
                details: format!("password hashing failed: {err}"),
            })?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC string.
    ///
    /// Returns [`ServerError::InvalidCredentials`] on any mismatch, including
    /// unparsable stored hashes.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> crate::error::Result<()> {
        let parsed = PasswordHash::new(phc_hash)
            .map_err(|_| ServerError::InvalidCredentials)?;

        self.argon2()
            .verify_password(password.as_ref(), &parsed)
            .map_err(|_| ServerError::InvalidCredentials)
    }
}
