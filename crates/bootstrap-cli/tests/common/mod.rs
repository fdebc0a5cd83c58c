//! Shared fixtures for the bootstrap integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bootstrap_cli::api::{CreateUpdateRecordsResponse, GatewayError, StorageGateway};
use bootstrap_cli::BootstrapConfig;
use bootstrap_common::types::Record;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// In-memory storage service recording every request
#[derive(Default)]
pub struct RecordingGateway {
    pub fail: bool,
    pub batches: Mutex<Vec<Vec<String>>>,
    pub deleted: Mutex<Vec<String>>,
    pub calls: Mutex<usize>,
}

impl RecordingGateway {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.batches.lock().unwrap().iter().map(Vec::len).collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn outcome(&self) -> Result<(), GatewayError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            Err(GatewayError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "storage unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageGateway for RecordingGateway {
    async fn create_update_records(
        &self,
        records: &[Record],
        _skip_dupes: bool,
    ) -> Result<CreateUpdateRecordsResponse, GatewayError> {
        self.outcome()?;
        let ids: Vec<String> = records.iter().map(|r| r.display_id().to_string()).collect();
        self.batches.lock().unwrap().push(ids.clone());
        Ok(CreateUpdateRecordsResponse {
            record_count: ids.len(),
            record_ids: ids,
            ..CreateUpdateRecordsResponse::default()
        })
    }

    async fn delete_record(&self, id: &str) -> Result<(), GatewayError> {
        self.outcome()?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

fn raw_record(group: &str, entity: &str, index: usize) -> Value {
    json!({
        "id": format!("osdu:{group}--{entity}:{index}"),
        "kind": format!("osdu:wks:{group}--{entity}:1.0.0"),
        "data": {"Name": format!("{entity} {index}")},
        "meta": [],
    })
}

/// Write a manifest with `reference` ReferenceData and `master` MasterData records
pub fn write_manifest(dir: &Path, name: &str, reference: usize, master: usize) {
    let manifest = json!({
        "ReferenceData": (0..reference).map(|i| raw_record("reference-data", "UnitOfMeasure", i)).collect::<Vec<_>>(),
        "MasterData": (0..master).map(|i| raw_record("master-data", "Well", i)).collect::<Vec<_>>(),
    });
    std::fs::write(dir.join(name), serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
}

/// Configuration pointing at `manifests` with the given pool shape
pub fn config(manifests: &TempDir, storage_url: &str, threads: usize, batch: usize) -> BootstrapConfig {
    let env: HashMap<&str, String> = HashMap::from([
        ("ACL_OWNERS", r#"["data.default.owners@tenant1.example.com"]"#.to_string()),
        ("ACL_VIEWERS", r#"["data.default.viewers@tenant1.example.com"]"#.to_string()),
        ("LEGALTAGS", r#"["tenant1-demo-legaltag"]"#.to_string()),
        ("MANIFESTS_DIR", manifests.path().display().to_string()),
        ("STORAGE_URL", storage_url.to_string()),
        ("DATA_PARTITION_ID", "tenant1".to_string()),
        ("CLOUD_PROVIDER", "gc".to_string()),
        ("THREAD_NUMBER", threads.to_string()),
        ("BATCH_SIZE", batch.to_string()),
    ]);
    BootstrapConfig::from_lookup(|key| env.get(key).cloned()).unwrap()
}
