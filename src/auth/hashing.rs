use argon2::password_hash::SaltString;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
};
use rand::rngs::OsRng;

use crate::errors::{Result, StorefrontError};

pub fn password_hasher() -> Argon2<'static> {
    // Tuned for interactive API calls: Argon2id with moderate memory and a single iteration
    // keeps login latency low while retaining side-channel protections.
    const MEMORY_COST_KIB: u32 = 768;
    const ITERATIONS: u32 = 1;
    const PARALLELISM: u32 = 1;
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .unwrap_or(Params::DEFAULT);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// One-way password hashing used by registration and login.
pub trait PasswordEncoder: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    fn compare_passwords(&self, password: &str, password_hash: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct Argon2PasswordEncoder {
    argon2: Argon2<'static>,
}

impl Argon2PasswordEncoder {
    pub fn new() -> Self {
        Self { argon2: password_hasher() }
    }
}

impl Default for Argon2PasswordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordEncoder for Argon2PasswordEncoder {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| StorefrontError::internal(format!("Failed to hash password: {}", err)))?;
        Ok(hash.to_string())
    }

    fn compare_passwords(&self, password: &str, password_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|err| StorefrontError::internal(format!("Invalid password hash: {}", err)))?;
        Ok(self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}
