//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::auth::AuthError;
use crate::bulletin::BulletinError;
use crate::bus::BusError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Malformed request on stdin
    InvalidRequest,
    /// Store not created yet
    NotInitialized,
    /// Store failure; the store's own code is kept in the message
    StoreError,
    /// Bulletin document could not be loaded
    BulletinError,
    /// Change notification setup failed
    BusError,
    /// Credentials rejected or mutation not permitted
    AuthError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "COULOIR_CLI_CONFIG_ERROR",
            Self::IoError => "COULOIR_CLI_IO_ERROR",
            Self::InvalidRequest => "COULOIR_CLI_INVALID_REQUEST",
            Self::NotInitialized => "COULOIR_CLI_NOT_INITIALIZED",
            Self::StoreError => "COULOIR_CLI_STORE_ERROR",
            Self::BulletinError => "COULOIR_CLI_BULLETIN_ERROR",
            Self::BusError => "COULOIR_CLI_BUS_ERROR",
            Self::AuthError => "COULOIR_CLI_AUTH_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'couloir init' first.",
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_request(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        let message = match e.user_guidance() {
            Some(guidance) => format!("{} ({})", e, guidance),
            None => e.to_string(),
        };
        Self::new(CliErrorCode::StoreError, message)
    }
}

impl From<BulletinError> for CliError {
    fn from(e: BulletinError) -> Self {
        Self::new(CliErrorCode::BulletinError, e.to_string())
    }
}

impl From<BusError> for CliError {
    fn from(e: BusError) -> Self {
        Self::new(CliErrorCode::BusError, e.to_string())
    }
}

impl From<AuthError> for CliError {
    fn from(e: AuthError) -> Self {
        Self::new(CliErrorCode::AuthError, format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
