//! Password hashing.
//!
//! Digests are bcrypt strings carrying their own salt and cost, so `verify`
//! needs nothing but the stored hash.

use fitness_core::model::MAX_PASSWORD_BYTES;

use crate::error::CredentialError;

/// Lowest work factor bcrypt accepts.
pub const MIN_HASH_COST: u32 = 4;
/// Highest work factor bcrypt accepts.
pub const MAX_HASH_COST: u32 = 31;

/// Salted one-way password hashing.
#[derive(Debug, Clone, Copy)]
pub struct CredentialStore {
    cost: u32,
}

impl CredentialStore {
    #[must_use]
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Cheapest cost bcrypt accepts. For tests.
    #[must_use]
    pub fn fast() -> Self {
        Self::new(MIN_HASH_COST)
    }

    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::PasswordTooLong` past `MAX_PASSWORD_BYTES`,
    /// otherwise if the cost is out of range or hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(CredentialError::PasswordTooLong {
                max: MAX_PASSWORD_BYTES,
            });
        }
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Malformed hashes and over-long passwords verify as `false`.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        password.len() <= MAX_PASSWORD_BYTES && bcrypt::verify(password, hash).unwrap_or(false)
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
