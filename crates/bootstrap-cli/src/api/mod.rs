//! Storage service API
//!
//! HTTP client for the record storage service plus the gateway trait the
//! dispatch workers submit through.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::StorageClient;
pub use types::*;

use async_trait::async_trait;
use bootstrap_common::types::Record;
use reqwest::StatusCode;
use thiserror::Error;

/// Classified storage failure
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Connection, timeout, or body transfer failure
    #[error("request to storage service failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-success status
    #[error("storage service responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The request could not be built; sending it again would not help
    #[error("invalid storage request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Network-level and HTTP status failures are worth another attempt
    pub fn is_retriable(&self) -> bool {
        matches!(self, GatewayError::Transport(_) | GatewayError::Status { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            GatewayError::InvalidRequest(err.to_string())
        } else {
            GatewayError::Transport(err)
        }
    }
}

/// Create/update and delete operations against the storage service
///
/// Implementations are shared by all workers and must be safe to call
/// concurrently.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Store `records` in one request
    async fn create_update_records(
        &self,
        records: &[Record],
        skip_dupes: bool,
    ) -> Result<CreateUpdateRecordsResponse, GatewayError>;

    /// Delete the record with `id`
    async fn delete_record(&self, id: &str) -> Result<(), GatewayError>;
}
