//! HTTP client for the storage service

use crate::api::{endpoints, CreateUpdateRecordsResponse, GatewayError, StorageGateway};
use crate::config::StorageConfig;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use bootstrap_common::types::Record;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use tracing::{debug, info};

/// Header carrying the target data partition
pub const DATA_PARTITION_HEADER: &str = "data-partition-id";

/// Storage service client
///
/// The bearer token is fixed at construction; it is obtained once before
/// dispatch starts and shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
}

impl StorageClient {
    /// Create a client for `config` authenticating with `token`
    pub fn new(config: &StorageConfig, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| CliError::auth("access token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let partition = HeaderValue::from_str(&config.data_partition_id).map_err(|_| {
            CliError::config("DATA_PARTITION_ID is not a valid header value")
        })?;
        headers.insert(DATA_PARTITION_HEADER, partition);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.storage_url.clone(),
        })
    }

    async fn check(response: Response) -> std::result::Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Status { status, body })
    }
}

#[async_trait]
impl StorageGateway for StorageClient {
    async fn create_update_records(
        &self,
        records: &[Record],
        skip_dupes: bool,
    ) -> std::result::Result<CreateUpdateRecordsResponse, GatewayError> {
        let url = endpoints::records_url(&self.base_url, skip_dupes);
        let body = serde_json::to_vec(records)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        debug!(records = records.len(), %url, "Sending create/update request");
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        // The batch is stored once the status is a success; a bad body only loses the summary.
        let response = match Self::check(response).await?.text().await {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                debug!(error = %e, "Unrecognized create/update response body");
                CreateUpdateRecordsResponse::default()
            }),
            Err(e) => {
                debug!(error = %e, "Failed to read create/update response body");
                CreateUpdateRecordsResponse::default()
            }
        };
        info!(
            record_count = response.record_count,
            skipped = response.skipped_record_ids.len(),
            "Storage accepted batch"
        );
        Ok(response)
    }

    async fn delete_record(&self, id: &str) -> std::result::Result<(), GatewayError> {
        let url = endpoints::delete_record_url(&self.base_url, id);

        debug!(%id, "Sending delete request");
        let response = self.client.post(&url).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
