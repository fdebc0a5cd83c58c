//! `storage-bootstrap load` command implementation
//!
//! Streams every manifest record, batches it, and creates or updates the
//! batches concurrently.

use crate::api::StorageGateway;
use crate::config::BootstrapConfig;
use crate::dispatch::{batches, BatchUpsert, ClaimCursor, DispatchPool, DispatchStats, ErrorAggregator, RetryPolicy};
use crate::error::Result;
use crate::manifest::ManifestStream;
use crate::progress;
use crate::transform::RecordsPreparer;
use bootstrap_common::types::Record;
use std::sync::Arc;
use tracing::info;

/// Load all manifests into the configured storage service
pub async fn run(config: &BootstrapConfig, skip_dupes: bool) -> Result<DispatchStats> {
    let gateway = super::connect(&config.storage).await?;
    let report = Arc::new(ErrorAggregator::new());
    run_with_gateway(config, gateway, skip_dupes, RetryPolicy::storage(), report).await
}

/// Load all manifests through `gateway`
///
/// Batches that cannot be stored are appended to `report`.
pub async fn run_with_gateway<G>(
    config: &BootstrapConfig,
    gateway: Arc<G>,
    skip_dupes: bool,
    retry: RetryPolicy,
    report: Arc<ErrorAggregator>,
) -> Result<DispatchStats>
where
    G: StorageGateway + ?Sized + 'static,
{
    info!(
        dir = %config.manifests_dir.display(),
        batch_size = config.batch_size.get(),
        workers = config.thread_number.get(),
        skip_dupes,
        "Loading manifests"
    );

    let stream = ManifestStream::open(RecordsPreparer::from_config(config), &config.manifests_dir)?;
    let units = batches(stream, config.batch_size)
        .map(|batch| batch.into_iter().collect::<bootstrap_common::Result<Vec<Record>>>());

    let spinner = progress::create_record_spinner("Storing");

    let outcome = DispatchPool::new(config.thread_number, retry)
        .run(
            Arc::new(ClaimCursor::new(units)),
            Arc::new(BatchUpsert::new(gateway, skip_dupes)),
            Arc::clone(&report),
            spinner.clone(),
        )
        .await;
    spinner.finish_and_clear();

    super::conclude("stored", outcome, &report)
}
