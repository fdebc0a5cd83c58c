//! Error types for the storage bootstrap tools

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Main error type shared by the bootstrap crates
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest text is not a valid manifest document after partition rewriting
    #[error("Malformed manifest '{}': {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    /// A raw record lacks a field the storage record requires
    #[error("Record #{index} in '{}' is missing required field '{field}'", path.display())]
    MissingField {
        path: PathBuf,
        index: usize,
        field: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BootstrapError {
    /// Create a malformed manifest error
    pub fn malformed_manifest(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedManifest {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
