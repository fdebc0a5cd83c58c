//! Worker pool draining a shared claim cursor

use crate::dispatch::cursor::ClaimCursor;
use crate::dispatch::report::{ErrorAggregator, ErrorReportEntry};
use crate::dispatch::retry::{RetryError, RetryPolicy};
use crate::dispatch::submit::Submitter;
use crate::error::{CliError, Result};
use indicatif::ProgressBar;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Counters summed over every worker of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub units_claimed: usize,
    pub units_stored: usize,
    pub units_failed: usize,
    pub records_stored: usize,
}

impl DispatchStats {
    fn merge(&mut self, other: DispatchStats) {
        self.units_claimed += other.units_claimed;
        self.units_stored += other.units_stored;
        self.units_failed += other.units_failed;
        self.records_stored += other.records_stored;
    }
}

struct WorkerOutcome {
    stats: DispatchStats,
    error: Option<CliError>,
}

/// Fixed-size pool of dispatch workers
#[derive(Debug, Clone, Copy)]
pub struct DispatchPool {
    workers: NonZeroUsize,
    retry: RetryPolicy,
}

impl DispatchPool {
    pub fn new(workers: NonZeroUsize, retry: RetryPolicy) -> Self {
        Self { workers, retry }
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Run every worker until `cursor` is exhausted or closed
    ///
    /// Returns only after all workers have joined. Units that exhaust their
    /// retries land in `report` and do not fail the run. A non-retriable
    /// gateway error, a record source error, or a worker panic closes the
    /// cursor; the remaining workers finish the unit they hold and stop, and
    /// that error is returned.
    pub async fn run<S: Submitter>(
        &self,
        cursor: Arc<ClaimCursor<S::Unit>>,
        submitter: Arc<S>,
        report: Arc<ErrorAggregator>,
        progress: ProgressBar,
    ) -> Result<DispatchStats> {
        info!(workers = self.workers(), unit = S::UNIT_NAME, "Spawning dispatch workers");

        let mut handles = Vec::with_capacity(self.workers());
        for worker in 0..self.workers() {
            let task = run_worker(
                Arc::clone(&cursor),
                Arc::clone(&submitter),
                Arc::clone(&report),
                self.retry,
                progress.clone(),
            )
            .instrument(info_span!("worker", worker));
            handles.push(tokio::spawn(task));
        }

        let mut stats = DispatchStats::default();
        let mut failure = None;

        for (worker, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(outcome) => {
                    stats.merge(outcome.stats);
                    if let Some(e) = outcome.error {
                        failure.get_or_insert(e);
                    }
                },
                Err(e) => {
                    error!(worker, error = %e, "Worker panicked");
                    cursor.close();
                    failure.get_or_insert(CliError::Worker(format!("worker {worker}: {e}")));
                },
            }
        }

        info!(
            units_claimed = stats.units_claimed,
            units_stored = stats.units_stored,
            units_failed = stats.units_failed,
            records = stats.records_stored,
            "All workers joined"
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}

/// Closes the cursor unless disarmed, so a worker dropped mid-run stops the others
struct CloseOnAbandon<U: 'static> {
    cursor: Arc<ClaimCursor<U>>,
    armed: bool,
}

impl<U: 'static> Drop for CloseOnAbandon<U> {
    fn drop(&mut self) {
        if self.armed {
            self.cursor.close();
        }
    }
}

async fn run_worker<S: Submitter>(
    cursor: Arc<ClaimCursor<S::Unit>>,
    submitter: Arc<S>,
    report: Arc<ErrorAggregator>,
    retry: RetryPolicy,
    progress: ProgressBar,
) -> WorkerOutcome {
    // A panicking task is dropped by the runtime with the guard still armed.
    let mut guard = CloseOnAbandon {
        cursor: Arc::clone(&cursor),
        armed: true,
    };
    let outcome = drain(cursor, submitter, report, retry, progress).await;
    guard.armed = false;
    outcome
}

async fn drain<S: Submitter>(
    cursor: Arc<ClaimCursor<S::Unit>>,
    submitter: Arc<S>,
    report: Arc<ErrorAggregator>,
    retry: RetryPolicy,
    progress: ProgressBar,
) -> WorkerOutcome {
    let mut stats = DispatchStats::default();

    loop {
        // Claiming may read and parse a manifest; keep that off the runtime threads.
        let source = Arc::clone(&cursor);
        let unit = match tokio::task::spawn_blocking(move || source.claim()).await {
            Ok(Ok(Some(unit))) => unit,
            Ok(Ok(None)) => {
                info!(units = stats.units_claimed, "Nothing left to claim, worker stopping");
                return WorkerOutcome { stats, error: None };
            },
            Ok(Err(e)) => {
                error!(error = %e, "Record source failed, stopping dispatch");
                return WorkerOutcome {
                    stats,
                    error: Some(e.into()),
                };
            },
            Err(e) => {
                error!(error = %e, "Claim task failed, stopping dispatch");
                cursor.close();
                return WorkerOutcome {
                    stats,
                    error: Some(CliError::Worker(format!("claim failed: {e}"))),
                };
            },
        };
        stats.units_claimed += 1;

        let unit = submitter.prepare(unit);
        let (target, held) = (submitter.as_ref(), &unit);

        match retry.run(move |attempt| target.submit(held, attempt)).await {
            Ok(records) => {
                stats.units_stored += 1;
                stats.records_stored += records;
                progress.inc(records as u64);
            },
            Err(RetryError::Exhausted { attempts, last }) => {
                error!(attempts, error = %last, "Giving up on {}", S::UNIT_NAME);
                stats.units_failed += 1;
                report.record(ErrorReportEntry::new(last.to_string(), submitter.unit_ids(&unit)));
            },
            Err(RetryError::Fatal(e)) => {
                error!(error = %e, "Non-retriable storage error, stopping dispatch");
                stats.units_failed += 1;
                report.record(ErrorReportEntry::new(e.to_string(), submitter.unit_ids(&unit)));
                cursor.close();
                return WorkerOutcome {
                    stats,
                    error: Some(e.into()),
                };
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::{CreateUpdateRecordsResponse, GatewayError, StorageGateway};
    use crate::dispatch::batch::batches;
    use crate::dispatch::submit::{BatchUpsert, RecordDelete};
    use async_trait::async_trait;
    use bootstrap_common::types::{Acl, Legal, Record};
    use bootstrap_common::BootstrapError;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fails each unit's first `failures` attempts, then succeeds
    #[derive(Default)]
    struct FlakyGateway {
        failures: u32,
        fatal: bool,
        attempts: Mutex<HashMap<String, u32>>,
        stored: Mutex<Vec<Vec<String>>>,
    }

    impl FlakyGateway {
        fn failing(failures: u32) -> Self {
            Self {
                failures,
                ..Self::default()
            }
        }

        fn attempt(&self, key: &str) -> std::result::Result<(), GatewayError> {
            if self.fatal {
                return Err(GatewayError::InvalidRequest("unserializable".into()));
            }
            let mut attempts = self.attempts.lock().unwrap();
            let seen = attempts.entry(key.to_string()).or_insert(0);
            *seen += 1;
            if *seen <= self.failures {
                Err(GatewayError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: format!("attempt {seen}"),
                })
            } else {
                Ok(())
            }
        }

        fn total_attempts(&self) -> u32 {
            self.attempts.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl StorageGateway for FlakyGateway {
        async fn create_update_records(
            &self,
            records: &[Record],
            _skip_dupes: bool,
        ) -> std::result::Result<CreateUpdateRecordsResponse, GatewayError> {
            self.attempt(records[0].display_id())?;
            self.stored
                .lock()
                .unwrap()
                .push(records.iter().map(|r| r.display_id().to_string()).collect());
            Ok(CreateUpdateRecordsResponse::default())
        }

        async fn delete_record(&self, id: &str) -> std::result::Result<(), GatewayError> {
            self.attempt(id)?;
            self.stored.lock().unwrap().push(vec![id.to_string()]);
            Ok(())
        }
    }

    fn record(id: usize) -> Record {
        Record::new(
            "osdu:wks:master-data--Well:1.0.0",
            json!({"n": id}),
            Acl::new(vec!["owners@t1".into()], vec!["viewers@t1".into()]),
            Legal::new(vec!["t1-legal".into()], vec!["US".into()]),
        )
        .with_id(format!("t1:master-data--Well:{id}"))
    }

    fn batch_cursor(records: usize, size: usize) -> Arc<ClaimCursor<Vec<Record>>> {
        let units = batches((0..records).map(record), NonZeroUsize::new(size).unwrap());
        Arc::new(ClaimCursor::from_units(units))
    }

    fn pool(workers: usize, retry: RetryPolicy) -> DispatchPool {
        DispatchPool::new(NonZeroUsize::new(workers).unwrap(), retry)
    }

    fn fast_storage() -> RetryPolicy {
        RetryPolicy::storage().with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_success_on_second_attempt_leaves_no_report() {
        let gateway = Arc::new(FlakyGateway::failing(1));
        let report = Arc::new(ErrorAggregator::new());

        let stats = pool(2, fast_storage())
            .run(
                batch_cursor(30, 10),
                Arc::new(BatchUpsert::new(Arc::clone(&gateway), false)),
                Arc::clone(&report),
                ProgressBar::hidden(),
            )
            .await
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(stats.units_stored, 3);
        assert_eq!(stats.records_stored, 30);
        assert_eq!(gateway.total_attempts(), 6);
    }

    #[tokio::test]
    async fn test_exhausted_units_are_reported_once() {
        let gateway = Arc::new(FlakyGateway::failing(u32::MAX));
        let report = Arc::new(ErrorAggregator::new());

        let stats = pool(3, fast_storage())
            .run(
                batch_cursor(25, 10),
                Arc::new(BatchUpsert::new(Arc::clone(&gateway), false)),
                Arc::clone(&report),
                ProgressBar::hidden(),
            )
            .await
            .unwrap();

        assert_eq!(stats.units_failed, 3);
        assert_eq!(stats.records_stored, 0);
        assert_eq!(report.len(), 3);
        assert_eq!(report.failed_record_count(), 25);
        assert_eq!(gateway.total_attempts(), 9);
        assert!(report.entries().iter().all(|e| e.error.contains("503")));
    }

    #[tokio::test]
    async fn test_each_batch_submitted_exactly_once() {
        let gateway = Arc::new(FlakyGateway::default());
        let report = Arc::new(ErrorAggregator::new());
        let cursor = batch_cursor(500, 7);

        let stats = pool(8, fast_storage())
            .run(
                Arc::clone(&cursor),
                Arc::new(BatchUpsert::new(Arc::clone(&gateway), true)),
                report,
                ProgressBar::hidden(),
            )
            .await
            .unwrap();

        let mut stored: Vec<String> = gateway.stored.lock().unwrap().concat();
        stored.sort();
        stored.dedup();
        assert_eq!(stored.len(), 500);
        assert_eq!(stats.units_claimed, 72);
        assert_eq!(cursor.claimed(), 72);
        assert_eq!(gateway.stored.lock().unwrap().len(), 72);
    }

    #[tokio::test]
    async fn test_empty_stream_joins_all_workers() {
        let stats = pool(4, fast_storage())
            .run(
                batch_cursor(0, 10),
                Arc::new(BatchUpsert::new(Arc::new(FlakyGateway::default()), false)),
                Arc::new(ErrorAggregator::new()),
                ProgressBar::hidden(),
            )
            .await
            .unwrap();

        assert_eq!(stats, DispatchStats::default());
    }

    #[tokio::test]
    async fn test_fatal_error_stops_run() {
        let gateway = Arc::new(FlakyGateway {
            fatal: true,
            ..FlakyGateway::default()
        });
        let report = Arc::new(ErrorAggregator::new());
        let cursor = batch_cursor(100, 10);

        let result = pool(1, fast_storage())
            .run(
                Arc::clone(&cursor),
                Arc::new(BatchUpsert::new(gateway, false)),
                Arc::clone(&report),
                ProgressBar::hidden(),
            )
            .await;

        assert!(matches!(result, Err(CliError::Gateway(GatewayError::InvalidRequest(_)))));
        assert!(cursor.is_closed());
        assert_eq!(cursor.claimed(), 1);
        assert_eq!(report.len(), 1);
        assert_eq!(report.failed_record_count(), 10);
    }

    #[tokio::test]
    async fn test_source_error_stops_run() {
        let units: Vec<bootstrap_common::Result<Vec<Record>>> = vec![
            Ok(vec![record(1)]),
            Err(BootstrapError::config("manifest vanished")),
            Ok(vec![record(2)]),
        ];
        let cursor = Arc::new(ClaimCursor::new(units.into_iter()));

        let result = pool(1, fast_storage())
            .run(
                cursor,
                Arc::new(BatchUpsert::new(Arc::new(FlakyGateway::default()), false)),
                Arc::new(ErrorAggregator::new()),
                ProgressBar::hidden(),
            )
            .await;

        assert!(matches!(result, Err(CliError::Bootstrap(_))));
    }

    #[tokio::test]
    async fn test_delete_failures_are_reported_without_retry() {
        let gateway = Arc::new(FlakyGateway::failing(1));
        let report = Arc::new(ErrorAggregator::new());
        let ids: Vec<String> = (0..5).map(|i| format!("t1:master-data--Well:{i}")).collect();

        let stats = pool(2, RetryPolicy::one_shot())
            .run(
                Arc::new(ClaimCursor::from_units(ids)),
                Arc::new(RecordDelete::new(Arc::clone(&gateway))),
                Arc::clone(&report),
                ProgressBar::hidden(),
            )
            .await
            .unwrap();

        assert_eq!(stats.units_failed, 5);
        assert_eq!(gateway.total_attempts(), 5);
        assert_eq!(report.failed_record_count(), 5);
    }

    /// Counts units; panics on `panic_on`
    struct Tally {
        panic_on: Option<usize>,
        delay: Duration,
    }

    #[async_trait]
    impl Submitter for Tally {
        type Unit = usize;

        const UNIT_NAME: &'static str = "unit";

        fn unit_ids(&self, unit: &usize) -> Vec<String> {
            vec![unit.to_string()]
        }

        async fn submit(&self, unit: &usize, _attempt: u32) -> std::result::Result<usize, GatewayError> {
            if self.panic_on == Some(*unit) {
                panic!("cannot submit unit {unit}");
            }
            tokio::time::sleep(self.delay).await;
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_slow_source_does_not_stall_runtime() {
        let source = (0..3).map(|unit| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(unit)
        });
        let widest_gap = Arc::new(Mutex::new(Duration::ZERO));

        let ticker = {
            let widest_gap = Arc::clone(&widest_gap);
            tokio::spawn(async move {
                loop {
                    let started = std::time::Instant::now();
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    let gap = started.elapsed();
                    let mut widest = widest_gap.lock().unwrap();
                    *widest = (*widest).max(gap);
                }
            })
        };

        let stats = pool(1, fast_storage())
            .run(
                Arc::new(ClaimCursor::new(source)),
                Arc::new(Tally {
                    panic_on: None,
                    delay: Duration::ZERO,
                }),
                Arc::new(ErrorAggregator::new()),
                ProgressBar::hidden(),
            )
            .await
            .unwrap();
        ticker.abort();

        assert_eq!(stats.units_stored, 3);
        let widest = *widest_gap.lock().unwrap();
        assert!(widest < Duration::from_millis(150), "runtime stalled for {widest:?}");
    }

    #[tokio::test]
    async fn test_worker_panic_stops_other_workers() {
        let cursor = Arc::new(ClaimCursor::from_units(0..1000));

        let result = pool(2, fast_storage())
            .run(
                Arc::clone(&cursor),
                Arc::new(Tally {
                    panic_on: Some(0),
                    delay: Duration::from_millis(20),
                }),
                Arc::new(ErrorAggregator::new()),
                ProgressBar::hidden(),
            )
            .await;

        assert!(matches!(result, Err(CliError::Worker(_))));
        assert!(cursor.is_closed());
        assert!(cursor.claimed() < 10, "claimed {} units after the panic", cursor.claimed());
    }
}
