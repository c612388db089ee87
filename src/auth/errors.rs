//! # Auth Errors

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown user or wrong password (indistinguishable on purpose)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Caller may not modify this point
    #[error("User {username} may not modify point {point_id}")]
    Unauthorized { username: String, point_id: u64 },

    /// Operation reserved to administrators
    #[error("User {username} is not an administrator")]
    AdminRequired { username: String },

    /// Unknown role name
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "COULOIR_AUTH_INVALID_CREDENTIALS",
            AuthError::Unauthorized { .. } => "COULOIR_AUTH_UNAUTHORIZED",
            AuthError::AdminRequired { .. } => "COULOIR_AUTH_ADMIN_REQUIRED",
            AuthError::UnknownRole(_) => "COULOIR_AUTH_UNKNOWN_ROLE",
        }
    }
}
