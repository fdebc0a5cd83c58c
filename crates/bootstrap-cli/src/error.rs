//! Error types for the bootstrap CLI
//!
//! Every variant is user-facing: the message says what went wrong and, where
//! there is one, what to change.

use crate::api::GatewayError;
use bootstrap_common::BootstrapError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Manifest reading or record transformation failed
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage service failure that retrying cannot fix
    #[error("Storage service error: {0}. Check STORAGE_URL, DATA_PARTITION_ID and the request payload.")]
    Gateway(#[from] GatewayError),

    /// Access token could not be obtained
    #[error("Authentication failed: {0}. Check ACCESS_TOKEN or TOKEN_URL/CLIENT_ID/CLIENT_SECRET.")]
    Auth(String),

    /// A dispatch worker panicked or was cancelled
    #[error("Dispatch worker failed: {0}")]
    Worker(String),

    /// The run finished but some units could not be stored or deleted
    #[error("{failed} of {claimed} units failed; see the report above")]
    Incomplete { failed: usize, claimed: usize },

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions.")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a non-storage request failed
    #[error("Network request failed: {0}. Check your network connection and service URLs.")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }
}
