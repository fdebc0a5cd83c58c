//! CLI command implementations
//!
//! `load` and `delete` each wire configuration, the manifest stream, and the
//! dispatch pool together, then report what could not be handled.

pub mod delete;
pub mod load;

use crate::api::StorageClient;
use crate::auth;
use crate::config::StorageConfig;
use crate::dispatch::{DispatchStats, ErrorAggregator};
use crate::error::{CliError, Result};
use colored::Colorize;
use std::sync::Arc;
use tracing::{info, warn};

/// Obtain a token once and build the shared storage client
pub async fn connect(storage: &StorageConfig) -> Result<Arc<StorageClient>> {
    info!(
        url = %storage.storage_url,
        partition = %storage.data_partition_id,
        provider = %storage.cloud_provider,
        "Connecting to storage service"
    );
    let token = auth::refresher_from_env()?.refresh_token().await?;
    Ok(Arc::new(StorageClient::new(storage, &token)?))
}

/// Surface the error report and turn a dispatch outcome into the run result
///
/// The report is logged even when the run stopped on a fatal error. A run
/// that finished with report entries is `Incomplete`.
fn conclude(
    verb: &str,
    outcome: Result<DispatchStats>,
    report: &ErrorAggregator,
) -> Result<DispatchStats> {
    if let Some(rendered) = report.render() {
        warn!("Following records weren't {verb}:\n{rendered}");
    }

    let stats = outcome?;
    if !report.is_empty() {
        return Err(CliError::Incomplete {
            failed: report.len(),
            claimed: stats.units_claimed,
        });
    }

    println!(
        "{} {} {} records ({} requests)",
        "✓".green(),
        capitalize(verb),
        stats.records_stored,
        stats.units_stored
    );
    Ok(stats)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
