//! History errors

use thiserror::Error;

/// Errors reported by a navigation host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Writing a history entry failed
    #[error("History entry write failed: {0}")]
    WriteFailed(String),
}

/// History adapter errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Host primitive failed
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// The host event stream has already been handed to a listener
    #[error("Host event listener already running")]
    ListenerUnavailable,

    /// A tokio runtime is required for this operation
    #[error("No tokio runtime available")]
    NoRuntime,
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;
