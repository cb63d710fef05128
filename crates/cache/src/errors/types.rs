//! Core error types for the advisor

use std::path::PathBuf;
use std::time::Duration;

/// Result type for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

pub use AdvisorError as Error;

/// Error type for advisor construction and configuration
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    /// A configuration value violates an invariant
    #[error("invalid configuration for '{field}': {message}")]
    InvalidConfiguration { field: &'static str, message: String },

    /// A recommendation was inserted with a non-positive lifetime
    #[error("invalid TTL {ttl:?}: entries must expire strictly after creation")]
    InvalidTtl { ttl: Duration },

    /// The named eviction policy does not exist
    #[error("unknown eviction policy '{name}'")]
    UnknownEvictionPolicy { name: String },

    /// The configuration file could not be read
    #[error("failed to read configuration file '{}'", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape
    #[error("failed to parse configuration file '{}'", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AdvisorError {
    #[must_use]
    pub fn invalid_configuration(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            message: message.into(),
        }
    }
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Fall back to the given default value
    UseDefault { value: String },
    /// Fix the offending configuration value
    UpdateConfiguration { field: &'static str },
    /// Check file permissions
    CheckPermissions { path: PathBuf },
    /// No automated recovery possible
    Manual { instructions: String },
}
