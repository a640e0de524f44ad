//! Route table errors

use thiserror::Error;

/// Errors raised while compiling patterns or building paths
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A required `:param` had no value when building a path
    #[error("Missing param :{param} for pattern {pattern}")]
    MissingParam {
        /// Name of the missing parameter
        param: String,
        /// Pattern being interpolated
        pattern: String,
    },

    /// No route is registered under this name
    #[error("Unknown route name: {0}")]
    UnknownRoute(String),

    /// Two patterns were registered under the same name
    #[error("Duplicate route name: {0}")]
    DuplicateRouteName(String),

    /// Pattern string could not be compiled
    #[error("Invalid pattern {pattern}: {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type for route operations
pub type Result<T> = std::result::Result<T, RouteError>;
