//! Point store error types
//!
//! Error codes:
//! - COULOIR_STORE_UNAVAILABLE (FATAL severity) - engine missing, closed or unusable
//! - COULOIR_STORE_BLOCKED (ERROR severity) - schema upgrade blocked by another open context
//! - COULOIR_STORE_IO (ERROR severity) - operation-level failure
//! - COULOIR_STORE_NOT_FOUND (ERROR severity) - update of an absent record
//! - COULOIR_STORE_INVALID_RECORD (ERROR severity) - record failed shape validation
//! - COULOIR_DATA_CORRUPTION (FATAL severity) - checksum failure in the record file

use std::fmt;
use std::io;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the store stays usable
    Error,
    /// The store cannot be used until the condition is resolved
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    StoreUnavailable,
    StoreBlocked,
    StoreIo,
    StoreNotFound,
    StoreInvalidRecord,
    DataCorruption,
}

impl StoreErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::StoreUnavailable => "COULOIR_STORE_UNAVAILABLE",
            StoreErrorCode::StoreBlocked => "COULOIR_STORE_BLOCKED",
            StoreErrorCode::StoreIo => "COULOIR_STORE_IO",
            StoreErrorCode::StoreNotFound => "COULOIR_STORE_NOT_FOUND",
            StoreErrorCode::StoreInvalidRecord => "COULOIR_STORE_INVALID_RECORD",
            StoreErrorCode::DataCorruption => "COULOIR_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::StoreUnavailable => Severity::Fatal,
            StoreErrorCode::DataCorruption => Severity::Fatal,
            StoreErrorCode::StoreBlocked
            | StoreErrorCode::StoreIo
            | StoreErrorCode::StoreNotFound
            | StoreErrorCode::StoreInvalidRecord => Severity::Error,
        }
    }

    /// Whether this is an operation-level failure (the IO category)
    pub fn is_operation_failure(&self) -> bool {
        matches!(
            self,
            StoreErrorCode::StoreIo
                | StoreErrorCode::StoreNotFound
                | StoreErrorCode::StoreInvalidRecord
        )
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with full context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// The persistence engine is missing, closed or at an unsupported version
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::StoreUnavailable, message)
    }

    /// Another open context holds an older-version connection
    pub fn blocked(persisted: u32, target: u32) -> Self {
        Self::new(
            StoreErrorCode::StoreBlocked,
            "schema upgrade blocked by another open connection",
        )
        .with_details(format!("persisted_version: {}, target_version: {}", persisted, target))
    }

    /// Operation-level I/O failure
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(StoreErrorCode::StoreIo, message)
        }
    }

    /// Operation-level failure without an I/O source
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::StoreIo, message)
    }

    /// Record addressed by `key` does not exist in `collection`
    pub fn not_found(collection: &str, key: impl fmt::Display) -> Self {
        Self::new(StoreErrorCode::StoreNotFound, "record not found")
            .with_details(format!("{}: {}", collection, key))
    }

    /// Record failed shape validation
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::StoreInvalidRecord, message)
    }

    /// Data corruption with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::DataCorruption, reason)
            .with_details(format!("byte_offset: {}", offset))
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error blocks every further store operation
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub fn is_blocked(&self) -> bool {
        self.code == StoreErrorCode::StoreBlocked
    }

    pub fn is_not_found(&self) -> bool {
        self.code == StoreErrorCode::StoreNotFound
    }

    /// Persistent, actionable message for conditions that block mutation.
    ///
    /// `None` for operation-level failures, which only concern one call.
    pub fn user_guidance(&self) -> Option<&'static str> {
        match self.code {
            StoreErrorCode::StoreUnavailable => Some(
                "The couloir store cannot be opened. Check that the data directory exists \
                 and is writable, then restart the application.",
            ),
            StoreErrorCode::StoreBlocked => Some(
                "The couloir store is being upgraded. Close other open instances of the \
                 application to continue.",
            ),
            StoreErrorCode::DataCorruption => Some(
                "The couloir store is damaged. Restore records.dat from a backup, or remove \
                 the store directory and run `couloir init` to start over.",
            ),
            _ => None,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
