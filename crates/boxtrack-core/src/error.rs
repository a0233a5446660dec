//! Error types for boxtrack.
//!
//! Most failures in this crate are recoverable at the batch level: a container
//! that cannot be read is skipped, a storage directory that cannot be moved is
//! reported and left behind. The variants here carry enough context for the
//! caller to log the item and keep going.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the boxtrack library.
#[derive(Debug, Error)]
pub enum BoxtrackError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Container errors
    #[error("Failed to extract entities from {container}: {message}")]
    Extraction { container: PathBuf, message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for boxtrack operations.
pub type Result<T> = std::result::Result<T, BoxtrackError>;

impl From<std::io::Error> for BoxtrackError {
    fn from(err: std::io::Error) -> Self {
        BoxtrackError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for BoxtrackError {
    fn from(err: serde_json::Error) -> Self {
        BoxtrackError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl BoxtrackError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        BoxtrackError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create an extraction error for a container.
    pub fn extraction(container: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BoxtrackError::Extraction {
            container: container.into(),
            message: message.into(),
        }
    }

    /// Whether the failure only concerns one item of a batch.
    ///
    /// Skippable errors are logged and the batch continues with the next
    /// container or identity.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            BoxtrackError::Io { .. }
                | BoxtrackError::Json { .. }
                | BoxtrackError::Extraction { .. }
                | BoxtrackError::NotADirectory(_)
        )
    }
}
