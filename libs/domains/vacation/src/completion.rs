//! Job completion with failure classification.
//!
//! | error                                         | outcome                      |
//! |-----------------------------------------------|------------------------------|
//! | NOT_FOUND, FAILED_PRECONDITION, INVALID_ARGUMENT | `Stale`, never retried    |
//! | transient (unavailable, timeout, transport)   | retried, then `Failed`       |
//! | RESOURCE_EXHAUSTED                            | retried longer, then `Failed`|
//! | anything else                                 | `Failed`                     |
//!
//! A shutdown request during a retry backoff ends the attempt with
//! `Interrupted`; an attempt already sent to the engine is awaited.

use crate::correlation::CorrelationKey;
use messaging::{ErrorCategory, RetryPolicy};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use zeebe_client::{JobClient, ZeebeError};

/// How hard to try completing one job.
#[derive(Debug, Clone)]
pub struct CompletionPolicy {
    /// Deadline for a single CompleteJob attempt
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl CompletionPolicy {
    /// Report every failure and move on.
    pub fn report_only() -> Self {
        Self {
            retry: RetryPolicy::none(),
            ..Default::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn retry_limit(&self, category: ErrorCategory) -> u32 {
        match category {
            ErrorCategory::Transient => self.retry.max_transient_retries,
            ErrorCategory::RateLimited => self.retry.max_rate_limit_retries,
            ErrorCategory::Permanent => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    /// The engine no longer knows the job as active
    Stale,
    /// Gave up; the job stays open until its lease expires
    Failed,
    /// Shutdown arrived while waiting to retry
    Interrupted,
}

impl CompletionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionOutcome::Completed => "completed",
            CompletionOutcome::Stale => "stale",
            CompletionOutcome::Failed => "failed",
            CompletionOutcome::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for CompletionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completes jobs named by correlation keys.
pub struct JobCompleter<C: ?Sized> {
    client: Arc<C>,
    policy: CompletionPolicy,
}

impl<C: JobClient + ?Sized> JobCompleter<C> {
    pub fn new(client: Arc<C>, policy: CompletionPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &CompletionPolicy {
        &self.policy
    }

    /// Complete the job, retrying per policy. Never returns an error: every
    /// failure is resolved into an outcome and logged.
    pub async fn complete(&self, key: CorrelationKey, shutdown: &mut watch::Receiver<bool>) -> CompletionOutcome {
        let job_key = key.job_key();
        let mut retries = 0u32;

        loop {
            let error = match self.attempt(job_key).await {
                Ok(()) => {
                    info!(job_key, attempts = retries + 1, "Job completed");
                    return CompletionOutcome::Completed;
                }
                Err(e) => e,
            };

            if error.is_stale() {
                warn!(job_key, error = %error, "Job is no longer active, completion skipped");
                return CompletionOutcome::Stale;
            }

            let category = error.category();
            if retries >= self.policy.retry_limit(category) {
                error!(
                    job_key,
                    error = %error,
                    category = %category,
                    attempts = retries + 1,
                    "Could not complete job, it stays open until its lease expires"
                );
                return CompletionOutcome::Failed;
            }

            let delay = self.policy.retry.backoff.delay(retries);
            retries += 1;
            warn!(
                job_key,
                error = %error,
                category = %category,
                retry = retries,
                backoff_ms = delay.as_millis() as u64,
                "Job completion failed, retrying"
            );
            if shutdown_during(delay, shutdown).await {
                warn!(job_key, retries, "Shutdown requested, completion retries abandoned");
                return CompletionOutcome::Interrupted;
            }
        }
    }

    async fn attempt(&self, job_key: i64) -> Result<(), ZeebeError> {
        match tokio::time::timeout(self.policy.request_timeout, self.client.complete_job(job_key, None)).await {
            Ok(result) => result,
            Err(_) => Err(ZeebeError::Timeout {
                command: "CompleteJob",
            }),
        }
    }
}

/// Sleep for `delay`, returning early with `true` if shutdown is requested.
async fn shutdown_during(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed() => match changed {
                Ok(()) if *shutdown.borrow() => return true,
                Ok(()) => continue,
                // Nobody can request shutdown any more.
                Err(_) => {
                    sleep.as_mut().await;
                    return false;
                }
            },
        }
    }
}
