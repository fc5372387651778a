//! Error types for configuration loading.
//!
//! Only configuration problems are errors in this crate. Task divergence and
//! apply failures are reported as data through [`crate::CheckOutcome`] and
//! [`crate::ApplyOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run before any task is planned.
#[derive(Debug, Error)]
pub enum Error {
    /// The base configuration file does not exist
    #[error("config file not found: {}", path.display())]
    NotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// The file exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path of the unreadable file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed in its declared format
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// Path of the malformed file
        path: PathBuf,
        /// Parser error message
        message: String,
    },

    /// The file extension is not a known config format
    #[error("unsupported config format: {} (expected .yml, .yaml, .toml or .json)", path.display())]
    UnsupportedFormat {
        /// Path with the unknown extension
        path: PathBuf,
    },

    /// The document root is a scalar or a sequence
    #[error("{} must contain a mapping at the top level", path.display())]
    NotAMapping {
        /// Path of the offending file
        path: PathBuf,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;
