//! Cryptographic utilities
//!
//! Security-critical primitives that must be implemented correctly to
//! prevent timing attacks and other side-channel vulnerabilities.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Constant-time byte slice comparison.
///
/// # Security
/// - Returns `false` immediately if lengths differ (length is not secret)
/// - Compares all bytes even after finding a difference
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Constant-time string comparison.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Securely hash a token for storage.
///
/// Uses SHA-256 to create a one-way hash of the token; the blacklist
/// never holds the raw credential.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello world", b"hello world"));
        assert!(!constant_time_eq(b"hello world", b"hello worle"));
        assert!(!constant_time_eq(b"hello", b"hello world"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_constant_time_str_eq() {
        assert!(constant_time_str_eq("secret", "secret"));
        assert!(!constant_time_str_eq("secret", "secreT"));
    }

    #[test]
    fn test_hash_token() {
        let hash1 = hash_token("bearer_token_value");
        let hash2 = hash_token("bearer_token_value");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 = 32 bytes = 64 hex chars

        assert_ne!(hash1, hash_token("different_token"));
    }
}
