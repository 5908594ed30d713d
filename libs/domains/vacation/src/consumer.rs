//! Consumer loop: one record at a time, each turned into a job completion.
//!
//! ```text
//! next ──▶ parse correlation key ──▶ complete job ──▶ commit ──▶ next
//!                 │ malformed                              ▲
//!                 └────────────── log, count ──────────────┘
//! ```
//!
//! The loop checks for shutdown before every pull and while waiting for a
//! record. A completion attempt that has reached the engine is always allowed
//! to finish; a shutdown during a retry backoff leaves the record uncommitted
//! for redelivery. While a record is handled the loop keeps it alive on the
//! broker so it is not redelivered mid-completion. The subscription is closed
//! once, whichever way the loop ends.

use crate::completion::{CompletionOutcome, JobCompleter};
use crate::correlation::CorrelationKey;
use crate::error::BridgeResult;
use crate::metrics::BridgeMetrics;
use messaging::{BackoffStrategy, InboundRecord, RecordSubscription};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use zeebe_client::JobClient;

/// Counters for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub consumed: u64,
    pub completed: u64,
    pub stale: u64,
    pub failed: u64,
    pub malformed: u64,
}

pub struct CompletionLoop<C: ?Sized> {
    completer: JobCompleter<C>,
    error_backoff: BackoffStrategy,
    keep_alive_interval: Duration,
    metrics: BridgeMetrics,
}

impl<C: JobClient + ?Sized> CompletionLoop<C> {
    pub fn new(completer: JobCompleter<C>) -> Self {
        Self {
            completer,
            error_backoff: BackoffStrategy::Exponential {
                base: Duration::from_secs(1),
                max: Duration::from_secs(30),
            },
            keep_alive_interval: Duration::from_secs(15),
            metrics: BridgeMetrics,
        }
    }

    /// Delay between attempts when pulling from the broker fails.
    pub fn with_error_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// How often a record still being handled is reported as in progress.
    /// Keep it well below the subscription's ack wait.
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Consume until shutdown, the end of the subscription, or a broker error
    /// that cannot be retried.
    pub async fn run<S>(&self, mut subscription: S, mut shutdown: watch::Receiver<bool>) -> BridgeResult<LoopSummary>
    where
        S: RecordSubscription,
    {
        info!("Starting completion loop");

        let result = self.consume(&mut subscription, &mut shutdown).await;

        match subscription.close().await {
            Ok(()) => debug!("Subscription closed"),
            Err(e) => warn!(error = %e, "Failed to close subscription"),
        }

        let summary = result?;
        info!(
            consumed = summary.consumed,
            completed = summary.completed,
            stale = summary.stale,
            failed = summary.failed,
            malformed = summary.malformed,
            "Completion loop stopped"
        );
        Ok(summary)
    }

    async fn consume<S>(&self, subscription: &mut S, shutdown: &mut watch::Receiver<bool>) -> BridgeResult<LoopSummary>
    where
        S: RecordSubscription,
    {
        let mut summary = LoopSummary::default();
        let mut consecutive_errors: u32 = 0;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping completion loop");
                break;
            }

            let next = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                next = subscription.next() => next,
            };

            let record = match next {
                Ok(Some(record)) => {
                    consecutive_errors = 0;
                    record
                }
                Ok(None) => {
                    info!("Subscription ended");
                    break;
                }
                Err(e) if e.category().is_retryable() => {
                    consecutive_errors += 1;
                    let delay = self.error_backoff.delay(consecutive_errors - 1);
                    warn!(
                        error = %e,
                        consecutive_errors,
                        backoff_ms = delay.as_millis() as u64,
                        "Failed to pull record, backing off"
                    );
                    tokio::select! {
                        _ = shutdown.changed() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "Subscription failed");
                    return Err(e.into());
                }
            };

            let outcome = self
                .handle_kept_alive(subscription, &record, &mut summary, shutdown)
                .await;

            if outcome == Some(CompletionOutcome::Interrupted) {
                info!(
                    sequence = record.sequence,
                    "Shutdown during completion retries, record left for redelivery"
                );
                break;
            }

            if let Err(e) = subscription.commit(&record).await {
                warn!(
                    sequence = record.sequence,
                    error = %e,
                    "Failed to commit record, it will be redelivered"
                );
            }
        }

        Ok(summary)
    }

    /// Handle a record while periodically extending its ack wait.
    async fn handle_kept_alive<S>(
        &self,
        subscription: &mut S,
        record: &InboundRecord,
        summary: &mut LoopSummary,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<CompletionOutcome>
    where
        S: RecordSubscription,
    {
        let handled = self.handle(record, summary, shutdown);
        tokio::pin!(handled);

        let mut heartbeat = tokio::time::interval_at(
            Instant::now() + self.keep_alive_interval,
            self.keep_alive_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                outcome = &mut handled => break outcome,
                _ = heartbeat.tick() => {
                    if let Err(e) = subscription.keep_alive(record).await {
                        warn!(sequence = record.sequence, error = %e, "Failed to extend ack wait");
                    }
                }
            }
        }
    }

    /// Returns the completion outcome, or `None` for a malformed record.
    async fn handle(
        &self,
        record: &InboundRecord,
        summary: &mut LoopSummary,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<CompletionOutcome> {
        summary.consumed += 1;
        self.metrics.record_consumed();

        info!(
            topic = %record.topic,
            key = record.key.as_deref().unwrap_or(""),
            value = %record.value,
            sequence = record.sequence,
            redelivered = record.is_redelivery(),
            "Consumed record"
        );

        let key = match CorrelationKey::parse(&record.value) {
            Ok(key) => key,
            Err(e) => {
                summary.malformed += 1;
                self.metrics.record_malformed();
                error!(
                    topic = %record.topic,
                    value = %record.value,
                    sequence = record.sequence,
                    error = %e,
                    "Record does not name a job, skipping"
                );
                return None;
            }
        };

        let outcome = self.completer.complete(key, shutdown).await;
        self.metrics.completion(outcome.as_str());
        match outcome {
            CompletionOutcome::Completed => summary.completed += 1,
            CompletionOutcome::Stale => summary.stale += 1,
            CompletionOutcome::Failed => summary.failed += 1,
            CompletionOutcome::Interrupted => {}
        }
        Some(outcome)
    }
}
