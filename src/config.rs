//! Router configuration
//!
//! Every field has a default, so a partial JSON document is a valid
//! configuration:
//!
//! ```
//! use pathway::RouterConfig;
//!
//! let config = RouterConfig::from_json(r#"{ "use_hash": false, "base": "/app" }"#).unwrap();
//! assert_eq!(config.base.as_deref(), Some("/app"));
//! assert_eq!(config.exit_timeout_ms, 1000);
//! ```

use history::{Location, DEFAULT_MAX_REDIRECTS};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default exit timeout ceiling in milliseconds
pub const DEFAULT_EXIT_TIMEOUT_MS: u64 = 1000;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for a configuration
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A non-empty base must start with `/`
    #[error("Invalid base {0:?}: must be empty or start with '/'")]
    InvalidBase(String),
}

/// Router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Base prefix; derived from the host location in hash mode when unset
    pub base: Option<String>,
    /// Route on the URL fragment instead of the path
    pub use_hash: bool,
    /// Exit timeout ceiling for leaving layers, in milliseconds
    pub exit_timeout_ms: u64,
    /// Longest chain of guard redirects followed before giving up
    pub max_redirects: u32,
    /// Run an appear transition for the first layer a viewer mounts
    pub appear: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base: None,
            use_hash: true,
            exit_timeout_ms: DEFAULT_EXIT_TIMEOUT_MS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            appear: false,
        }
    }
}

impl RouterConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base prefix
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Enable or disable hash routing
    pub fn use_hash(mut self, enabled: bool) -> Self {
        self.use_hash = enabled;
        self
    }

    /// Set the exit timeout ceiling
    pub fn exit_timeout_ms(mut self, ms: u64) -> Self {
        self.exit_timeout_ms = ms;
        self
    }

    /// Limit chained guard redirects
    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = max;
        self
    }

    /// Enable or disable the appear transition on first mount
    pub fn appear(mut self, enabled: bool) -> Self {
        self.appear = enabled;
        self
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.base.as_deref() {
            Some(base) if !base.is_empty() && !base.starts_with('/') => {
                Err(ConfigError::InvalidBase(base.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Exit timeout ceiling
    pub fn exit_timeout(&self) -> Duration {
        Duration::from_millis(self.exit_timeout_ms)
    }

    /// Base prefix to use with a host currently at `location`
    ///
    /// An explicit base wins. Otherwise hash mode uses the current pathname
    /// without its trailing `/`, and path mode uses no base.
    pub fn resolve_base(&self, location: &Location) -> String {
        match &self.base {
            Some(base) => base.clone(),
            None if self.use_hash => location.pathname.trim_end_matches('/').to_string(),
            None => String::new(),
        }
    }
}
