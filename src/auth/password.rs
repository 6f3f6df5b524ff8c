/// Password Hashing and Verification
///
/// Argon2id with a fresh random salt per hash. The salt and cost parameters
/// travel inside the PHC-encoded digest, so verification needs nothing else.

use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

use crate::error::AuthError;

/// Hash a password using Argon2id
///
/// # Errors
/// Returns `AuthError::Hashing` if the underlying algorithm fails
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(format!("argon2 hash: {}", e)))
}

/// Verify a password against its digest in constant time
///
/// `Ok(false)` means the password does not match. A digest that cannot be
/// parsed is an error, not a mismatch.
///
/// # Errors
/// Returns `AuthError::Hashing` if `hash` is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Hashing(format!("bad password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hashing(format!("argon2 verify: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "pa$$word";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_password() {
        for password in ["pa$$word", "name", ""] {
            let hash = hash_password(password).expect("Failed to hash password");
            let is_valid = verify_password(password, &hash).expect("Failed to verify password");
            assert!(is_valid, "password {:?} should verify", password);
        }
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("ValidPassword123").expect("Failed to hash password");

        let is_valid = verify_password("WrongPassword123", &hash).expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_same_password_gets_fresh_salt() {
        let first = hash_password("repeat-me").unwrap();
        let second = hash_password("repeat-me").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("repeat-me", &first).unwrap());
        assert!(verify_password("repeat-me", &second).unwrap());
    }

    #[test]
    fn test_malformed_digest_is_an_error() {
        let result = verify_password("whatever", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }
}
