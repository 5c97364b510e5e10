//! Password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::AuthError;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash a password with bcrypt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash(password, DEFAULT_COST).map_err(|e| {
        tracing::error!("bcrypt hash error: {e}");
        AuthError::Internal("password hashing failed".to_string())
    })
}

/// Verify a password against a stored bcrypt hash.
///
/// A malformed stored hash reads as a failed verification rather than an
/// internal error, so probing cannot distinguish the two.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}

/// Check password policy (length only, matching the original product rule)
pub fn check_password_policy(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hashed = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hashed));
        assert!(!verify_password("wrong-pass", &hashed));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn policy_rejects_short_passwords() {
        assert!(check_password_policy("12345").is_err());
        assert!(check_password_policy("123456").is_ok());
    }
}
