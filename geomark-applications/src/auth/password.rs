//! Password hashing and verification with Argon2id
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...`) carrying their own salt,
//! so the credential record needs no separate salt field.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use geomark_core::{ErrorContext, GeomarkError, GeomarkResult};

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> GeomarkResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GeomarkError::Internal {
            message: format!("Failed to hash password: {}", e),
            source: None,
            context: ErrorContext::new("password").with_operation("hash_password"),
        })
}

/// Verify a password against a stored PHC hash.
///
/// A malformed stored hash is an error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> GeomarkResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| GeomarkError::Internal {
        message: format!("Stored password hash is malformed: {}", e),
        source: None,
        context: ErrorContext::new("password")
            .with_operation("verify_password")
            .with_suggestion("Register again to replace the stored credentials"),
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("pw123").unwrap();
        let second = hash_password("pw123").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("pw123"));
    }

    #[test]
    fn test_verify() {
        let hash = hash_password("pw123").unwrap();
        assert!(verify_password("pw123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("pw123", "pw123").is_err());
    }
}
