//! # Credential hashing
//!
//! Stored password hashes are lowercase hex SHA-256 digests of the
//! password. Every comparison of hashes is constant-time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a password for storage
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Verify a plaintext password against a stored hash
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    constant_time_str_eq(&hash_password(password), password_hash)
}
