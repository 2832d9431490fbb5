//! Password hashing and verification.
//!
//! Wraps bcrypt so the rest of the application never touches raw hashing
//! primitives. bcrypt is deliberately slow, which keeps brute-forcing stored
//! hashes expensive.

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::{ServiceError, ServiceResult};

/// Hashes a plain text password before it is stored.
///
/// # Errors
/// Returns `ServiceError::Validation` if hashing fails
pub fn hash_password(password: &str) -> ServiceResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ServiceError::validation(format!("Password hashing failed: {}", e)))
}

/// Verifies a plain text password against a stored hash.
///
/// # Returns
/// `true` if the password matches the hash, `false` otherwise
///
/// # Errors
/// Returns `ServiceError::Validation` if the verification process fails
pub fn verify_password(password: &str, hashed: &str) -> ServiceResult<bool> {
    verify(password, hashed)
        .map_err(|e| ServiceError::validation(format!("Password verification failed: {}", e)))
}

/// Hashes an optional secret for partial updates.
///
/// An absent or empty secret means "leave the stored hash unchanged", so the
/// hashing step is skipped entirely and `None` is returned.
pub fn hash_if_present(password: Option<&str>) -> ServiceResult<Option<String>> {
    match password {
        Some(p) if !p.is_empty() => Ok(Some(hash_password(p)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_round_trip() {
        let hashed = hash_password("Abc12345").unwrap();
        assert_ne!(hashed, "Abc12345");
        assert!(verify_password("Abc12345", &hashed).unwrap());
        assert!(!verify_password("Abc12346", &hashed).unwrap());
    }

    #[test]
    fn test_hash_if_present_skips_absent_secret() {
        assert!(hash_if_present(None).unwrap().is_none());
        assert!(hash_if_present(Some("")).unwrap().is_none());
    }

    #[test]
    fn test_hash_if_present_hashes_supplied_secret() {
        let hashed = hash_if_present(Some("Abc12345")).unwrap().unwrap();
        assert!(verify_password("Abc12345", &hashed).unwrap());
    }
}
