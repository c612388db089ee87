//! # Bus Errors
//!
//! Only subscription setup can fail. Publishing is best-effort and never
//! reports delivery problems to the caller.

use thiserror::Error;

/// Result type for bus operations
pub type BusResult<T> = Result<T, BusError>;

#[derive(Debug, Error)]
pub enum BusError {
    /// Subscriptions forward messages from a task and need a tokio runtime
    #[error("No async runtime available for the subscription")]
    NoRuntime,

    /// The requested transport cannot be used in this process
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Setting up the key-file watch failed
    #[error("Watch setup failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("Bus directory unavailable: {0}")]
    Io(#[from] std::io::Error),
}
