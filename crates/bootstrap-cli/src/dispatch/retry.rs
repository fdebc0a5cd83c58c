//! Bounded fixed-delay retry for storage requests

use crate::api::GatewayError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How a submission is retried
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts; constant, no backoff
    pub delay: Duration,
    /// Whether an error may be retried at all
    pub retry_if: fn(&GatewayError) -> bool,
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt failed with a retriable error
    Exhausted { attempts: u32, last: GatewayError },
    /// An error the policy refuses to retry
    Fatal(GatewayError),
}

impl RetryPolicy {
    /// Create/update policy: 3 attempts, 3 seconds apart
    pub const fn storage() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(3),
            retry_if: GatewayError::is_retriable,
        }
    }

    /// Delete policy: a single attempt
    pub const fn one_shot() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::from_secs(1),
            retry_if: GatewayError::is_retriable,
        }
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run `op` until it succeeds, hits a fatal error, or runs out of attempts
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Storage request succeeded after retry");
                    }
                    return Ok(value);
                },
                Err(error) if !(self.retry_if)(&error) => return Err(RetryError::Fatal(error)),
                Err(error) if attempt >= max_attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: error,
                    })
                },
                Err(error) => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %error,
                        "Storage request failed, retrying in {:?}",
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                },
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::storage()
    }
}
