//! Password hashing for the user write path.
//!
//! The user repository only accepts a [`HashedPassword`], and the only way to
//! build one is [`HashedPassword::from_plain`], so every insert or password
//! update has to go through bcrypt first.

use bcrypt::{hash, verify};
use log::{error, warn};
use std::fmt;

use crate::error::AppError;
use crate::validate;

/// bcrypt work factor.
pub const HASH_COST: u32 = 10;

#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Validates the plaintext and replaces it with a salted bcrypt hash.
    pub fn from_plain(plain: &str) -> Result<Self, AppError> {
        validate::password(plain)?;
        hash(plain, HASH_COST).map(Self).map_err(|e| {
            error!("password hash failed: {}", e);
            AppError::system_exception()
        })
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

/// Checks `plain` against a stored hash. A malformed hash counts as a mismatch.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    match verify(plain, stored_hash) {
        Ok(ok) => ok,
        Err(e) => {
            warn!("stored password hash is unreadable: {}", e);
            false
        }
    }
}
