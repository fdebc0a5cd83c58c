//! Run configuration
//!
//! Everything is read from environment variables once, before any manifest is
//! opened or any request is sent. A missing or malformed required value
//! aborts the run.

use crate::error::{CliError, Result};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Worker count when `THREAD_NUMBER` is unset.
pub const DEFAULT_THREAD_NUMBER: usize = 3;

/// Records per storage request when `BATCH_SIZE` is unset.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// Legal "other relevant data countries" when `COUNTRY_CODES` is unset.
pub const DEFAULT_COUNTRY_CODES: &[&str] = &["US"];

/// Storage request timeout when `STORAGE_TIMEOUT_SECS` is unset.
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 300;

const USAGE_HINT: &str = "The following env variables must be set:\n\
    \tACL_OWNERS='[\"value_1\", \"value_2\"]'\n\
    \tACL_VIEWERS='[\"value_1\", \"value_2\"]'\n\
    \tLEGALTAGS='[\"value_1\", \"value_2\"]'\n\
    \tMANIFESTS_DIR='/path/to/manifests'\n\
    \tSTORAGE_URL, DATA_PARTITION_ID, CLOUD_PROVIDER";

/// Connection settings for the storage service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Base URL of the storage API, e.g. `https://host/api/storage/v2`
    pub storage_url: String,
    pub data_partition_id: String,
    pub cloud_provider: String,
    pub timeout: Duration,
}

/// Full configuration of a load or delete run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub acl_owners: Vec<String>,
    pub acl_viewers: Vec<String>,
    pub legaltags: Vec<String>,
    pub country_codes: Vec<String>,
    pub manifests_dir: PathBuf,
    pub thread_number: NonZeroUsize,
    pub batch_size: NonZeroUsize,
    /// Also rewrite the authority segment of kind strings
    pub rewrite_kind_authority: bool,
    pub storage: StorageConfig,
}

impl BootstrapConfig {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CliError::config(format!("{key} is not set.\n{USAGE_HINT}")))
        };

        let storage = StorageConfig {
            storage_url: required("STORAGE_URL")?.trim_end_matches('/').to_string(),
            data_partition_id: required("DATA_PARTITION_ID")?,
            cloud_provider: required("CLOUD_PROVIDER")?,
            timeout: Duration::from_secs(
                optional_number(&lookup, "STORAGE_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_STORAGE_TIMEOUT_SECS as usize) as u64,
            ),
        };

        let country_codes = match lookup("COUNTRY_CODES") {
            Some(raw) => parse_string_list("COUNTRY_CODES", &raw)?,
            None => DEFAULT_COUNTRY_CODES.iter().map(|c| c.to_string()).collect(),
        };

        let rewrite_kind_authority = match lookup("REWRITE_KIND_AUTHORITY") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                CliError::config(format!(
                    "REWRITE_KIND_AUTHORITY must be 'true' or 'false', got '{raw}'"
                ))
            })?,
            None => false,
        };

        Ok(Self {
            acl_owners: parse_string_list("ACL_OWNERS", &required("ACL_OWNERS")?)?,
            acl_viewers: parse_string_list("ACL_VIEWERS", &required("ACL_VIEWERS")?)?,
            legaltags: parse_string_list("LEGALTAGS", &required("LEGALTAGS")?)?,
            country_codes,
            manifests_dir: PathBuf::from(required("MANIFESTS_DIR")?),
            thread_number: positive(&lookup, "THREAD_NUMBER", DEFAULT_THREAD_NUMBER)?,
            batch_size: positive(&lookup, "BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            rewrite_kind_authority,
            storage,
        })
    }
}

fn parse_string_list(key: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| {
        CliError::config(format!(
            "{key} must be a JSON array of strings ({e}).\n{USAGE_HINT}"
        ))
    })
}

fn optional_number<F>(lookup: &F, key: &str) -> Result<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<usize>().map_err(|_| {
                CliError::config(format!("{key} must be a non-negative integer, got '{raw}'"))
            })
        })
        .transpose()
}

fn positive<F>(lookup: &F, key: &str, default: usize) -> Result<NonZeroUsize>
where
    F: Fn(&str) -> Option<String>,
{
    let value = optional_number(lookup, key)?.unwrap_or(default);
    NonZeroUsize::new(value)
        .ok_or_else(|| CliError::config(format!("{key} must be a positive integer, got 0")))
}
