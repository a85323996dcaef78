//! Password hashing using Argon2id
//!
//! All stored credentials are Argon2id PHC strings. Imported legacy rows
//! whose `password_hash` column does not look like one get re-hashed at
//! import time.
//!
//! # Example
//!
//! ```
//! use partledger_shared::auth::password::{hash_password, verify_password};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("super_secret_password_123")?;
//! assert!(hash.starts_with("$argon2id$"));
//!
//! assert!(verify_password("super_secret_password_123", &hash)?);
//! assert!(!verify_password("wrong_password", &hash)?);
//! # Ok(())
//! # }
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password using Argon2id with default parameters
///
/// Returns a PHC string (algorithm, parameters, salt, and hash), e.g.
///
/// ```text
/// $argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash string
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be
/// parsed. A wrong password is not an error; it returns `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Checks whether a stored credential already looks like one of ours
///
/// Used by the user import to decide between keeping a column value as-is
/// and re-hashing it.
pub fn is_phc_hash(value: &str) -> bool {
    value.starts_with("$argon2")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("test123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("test123", &hash).unwrap());
        assert!(!verify_password("test124", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_is_phc_hash() {
        assert!(is_phc_hash("$argon2id$v=19$m=19456,t=2,p=1$abc$def"));
        assert!(!is_phc_hash("pbkdf2:sha256:260000$legacy"));
        assert!(!is_phc_hash("changeme"));
    }
}
