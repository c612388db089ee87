//! # User Management
//!
//! Users live in the store's `users` collection, keyed by username.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::crypto::{hash_password, verify_password};
use super::errors::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(AuthError::UnknownRole(s.to_string())),
        }
    }
}

/// User model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique key
    pub username: String,

    /// Hex SHA-256 of the password (never plaintext)
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Create a user from a plaintext password
    pub fn new(username: impl Into<String>, password: &str, role: Role) -> Self {
        Self::with_hash(username, hash_password(password), role)
    }

    /// Create a user from an already hashed password
    pub fn with_hash(username: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            role,
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
