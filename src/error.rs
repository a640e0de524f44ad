//! Router errors

use crate::config::ConfigError;
use history::HistoryError;
use routes::RouteError;
use thiserror::Error;

/// Errors surfaced by a [`Router`](crate::Router)
#[derive(Debug, Error)]
pub enum RouterError {
    /// Route table or path building failed
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// History integration failed
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Configuration was rejected
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for router operations
pub type Result<T> = std::result::Result<T, RouterError>;
