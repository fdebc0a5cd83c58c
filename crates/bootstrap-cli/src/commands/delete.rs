//! `storage-bootstrap delete` command implementation
//!
//! Deletes every record the manifests describe, one id per request.

use crate::api::StorageGateway;
use crate::config::BootstrapConfig;
use crate::dispatch::{ClaimCursor, DispatchPool, DispatchStats, ErrorAggregator, RecordDelete, RetryPolicy};
use crate::error::Result;
use crate::manifest::ManifestStream;
use crate::progress;
use crate::transform::RecordsPreparer;
use std::sync::Arc;
use tracing::{info, warn};

/// Delete all manifest records from the configured storage service
pub async fn run(config: &BootstrapConfig) -> Result<DispatchStats> {
    let gateway = super::connect(&config.storage).await?;
    let report = Arc::new(ErrorAggregator::new());
    run_with_gateway(config, gateway, RetryPolicy::one_shot(), report).await
}

/// Delete all manifest records through `gateway`
///
/// Records without an id were never addressable and are skipped. Failed
/// deletions are appended to `report`.
pub async fn run_with_gateway<G>(
    config: &BootstrapConfig,
    gateway: Arc<G>,
    retry: RetryPolicy,
    report: Arc<ErrorAggregator>,
) -> Result<DispatchStats>
where
    G: StorageGateway + ?Sized + 'static,
{
    info!(
        dir = %config.manifests_dir.display(),
        workers = config.thread_number.get(),
        "Deleting manifest records"
    );

    let stream = ManifestStream::open(RecordsPreparer::from_config(config), &config.manifests_dir)?;
    let ids = stream.filter_map(|record| match record {
        Ok(record) => match record.id {
            Some(id) => Some(Ok(id)),
            None => {
                warn!(kind = %record.kind, "Skipping record without id");
                None
            },
        },
        Err(e) => Some(Err(e)),
    });

    let spinner = progress::create_record_spinner("Deleting");

    let outcome = DispatchPool::new(config.thread_number, retry)
        .run(
            Arc::new(ClaimCursor::new(ids)),
            Arc::new(RecordDelete::new(gateway)),
            Arc::clone(&report),
            spinner.clone(),
        )
        .await;
    spinner.finish_and_clear();

    super::conclude("deleted", outcome, &report)
}
