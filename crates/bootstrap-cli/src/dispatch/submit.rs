//! What a worker does with a claimed unit

use crate::api::{GatewayError, StorageGateway};
use crate::dispatch::batch::dedup_by_id;
use async_trait::async_trait;
use bootstrap_common::types::Record;
use std::sync::Arc;
use tracing::{debug, info};

/// Submission strategy for one kind of unit
#[async_trait]
pub trait Submitter: Send + Sync + 'static {
    type Unit: Send + Sync + 'static;

    /// Unit name used in log lines
    const UNIT_NAME: &'static str;

    /// Runs once per claimed unit, outside the claim lock
    fn prepare(&self, unit: Self::Unit) -> Self::Unit {
        unit
    }

    /// Record ids carried by `unit`, in submission order
    fn unit_ids(&self, unit: &Self::Unit) -> Vec<String>;

    /// Send `unit` once; returns the number of records handled
    async fn submit(&self, unit: &Self::Unit, attempt: u32) -> Result<usize, GatewayError>;
}

/// Create/update a batch of records
pub struct BatchUpsert<G: ?Sized> {
    gateway: Arc<G>,
    skip_dupes: bool,
}

impl<G: StorageGateway + ?Sized> BatchUpsert<G> {
    pub fn new(gateway: Arc<G>, skip_dupes: bool) -> Self {
        Self {
            gateway,
            skip_dupes,
        }
    }
}

#[async_trait]
impl<G: StorageGateway + ?Sized + 'static> Submitter for BatchUpsert<G> {
    type Unit = Vec<Record>;

    const UNIT_NAME: &'static str = "batch";

    fn prepare(&self, unit: Vec<Record>) -> Vec<Record> {
        let claimed = unit.len();
        let unit = dedup_by_id(unit);
        if unit.len() < claimed {
            debug!(
                claimed,
                unique = unit.len(),
                "Collapsed duplicate record ids in batch"
            );
        }
        unit
    }

    fn unit_ids(&self, unit: &Vec<Record>) -> Vec<String> {
        unit.iter().map(|r| r.display_id().to_string()).collect()
    }

    async fn submit(&self, unit: &Vec<Record>, attempt: u32) -> Result<usize, GatewayError> {
        info!(records = unit.len(), attempt, "Storing batch");
        self.gateway
            .create_update_records(unit, self.skip_dupes)
            .await?;
        Ok(unit.len())
    }
}

/// Delete a single record by id
pub struct RecordDelete<G: ?Sized> {
    gateway: Arc<G>,
}

impl<G: StorageGateway + ?Sized> RecordDelete<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl<G: StorageGateway + ?Sized + 'static> Submitter for RecordDelete<G> {
    type Unit = String;

    const UNIT_NAME: &'static str = "record";

    fn unit_ids(&self, unit: &String) -> Vec<String> {
        vec![unit.clone()]
    }

    async fn submit(&self, unit: &String, attempt: u32) -> Result<usize, GatewayError> {
        info!(id = %unit, attempt, "Deleting record");
        self.gateway.delete_record(unit).await?;
        Ok(1)
    }
}
