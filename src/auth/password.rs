// Password hashing and validation service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::auth::error::AuthError;

/// Minimum length for customer passwords and any password change
pub const MIN_PASSWORD_LEN: usize = 8;
/// Minimum length accepted when a mechanic account is created
pub const MECHANIC_MIN_PASSWORD_LEN: usize = 6;

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a random salt
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Verify a password against a PHC-format hash.
    /// An unparseable stored hash is an error, a wrong password is `Ok(false)`.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Length policy, counted in characters
    pub fn validate_password_strength(password: &str, min_len: usize) -> Result<(), AuthError> {
        if password.chars().count() < min_len {
            return Err(AuthError::WeakPassword(min_len));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordService::verify_password("secret123", &hash).unwrap());
        assert!(!PasswordService::verify_password("secret124", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = PasswordService::hash_password("secret123").unwrap();
        let second = PasswordService::hash_password("secret123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_corrupt_hash_is_error() {
        assert!(PasswordService::verify_password("secret123", "not-a-hash").is_err());
    }

    #[test]
    fn test_strength_policy() {
        assert!(PasswordService::validate_password_strength("1234567", MIN_PASSWORD_LEN).is_err());
        assert!(PasswordService::validate_password_strength("12345678", MIN_PASSWORD_LEN).is_ok());
        assert!(
            PasswordService::validate_password_strength("12345", MECHANIC_MIN_PASSWORD_LEN)
                .is_err()
        );
        assert!(
            PasswordService::validate_password_strength("123456", MECHANIC_MIN_PASSWORD_LEN)
                .is_ok()
        );
        // multi-byte characters count once
        assert!(PasswordService::validate_password_strength("ééééééé", MIN_PASSWORD_LEN).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_hash_verifies_original(password in "[a-zA-Z0-9!@#]{8,24}") {
            let hash = PasswordService::hash_password(&password)?;
            prop_assert!(PasswordService::verify_password(&password, &hash)?);
        }
    }
}
