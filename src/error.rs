//! Unified error handling for the route-replay library.
//!
//! Playback itself is total over its inputs; errors only come from loading a
//! route file and from rejected control input.

use thiserror::Error;

/// Unified error type for route-replay operations.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Route file could not be read
    #[error("Failed to read route file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Route file is not a valid list of samples
    #[error("Malformed route data: {0}")]
    Json(#[from] serde_json::Error),
    /// Speed multiplier must be finite and positive
    #[error("Invalid speed multiplier {0}, must be finite and > 0")]
    InvalidSpeed(f64),
    /// Timestamp string could not be parsed
    #[error("Unparseable timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Result type alias for route-replay operations.
pub type Result<T> = std::result::Result<T, ReplayError>;
