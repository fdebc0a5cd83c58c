//! Concurrent dispatch of records to the storage service
//!
//! A record stream is cut into units (batches for create/update, single ids
//! for deletion) behind a [`ClaimCursor`]. A [`DispatchPool`] runs N workers
//! that claim one unit at a time, submit it under a [`RetryPolicy`], and
//! append terminal failures to an [`ErrorAggregator`].

pub mod batch;
pub mod cursor;
pub mod pool;
pub mod report;
pub mod retry;
pub mod submit;

pub use batch::{batches, dedup_by_id, Batches};
pub use cursor::ClaimCursor;
pub use pool::{DispatchPool, DispatchStats};
pub use report::{ErrorAggregator, ErrorReportEntry};
pub use retry::{RetryError, RetryPolicy};
pub use submit::{BatchUpsert, RecordDelete, Submitter};
