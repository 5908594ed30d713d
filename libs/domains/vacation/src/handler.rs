//! Job handler that turns `put` jobs into broker records.

use crate::confirmation::{publish_confirmed, DEFAULT_ACK_TIMEOUT};
use crate::metrics::BridgeMetrics;
use crate::models::OutboundMessage;
use async_trait::async_trait;
use messaging::RecordPublisher;
use std::time::Duration;
use tracing::{info, warn};
use zeebe_client::{ActivatedJob, JobError, JobHandler};

/// What to do with a job whose record was not confirmed by the broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishFailurePolicy {
    /// Fail the job so the engine offers it again with one retry less
    #[default]
    FailJob,
    /// Log the failure and leave the job to its lease timeout
    LogOnly,
}

/// Publishes one record per job and leaves the job open.
///
/// The job is completed later by whoever consumes the record. The handler
/// only returns once the broker has confirmed or refused the record, or the
/// acknowledgment wait has elapsed.
pub struct PublishJobHandler<P> {
    publisher: P,
    topic: String,
    ack_timeout: Duration,
    failure_policy: PublishFailurePolicy,
    metrics: BridgeMetrics,
}

impl<P: RecordPublisher> PublishJobHandler<P> {
    pub fn new(publisher: P, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            failure_policy: PublishFailurePolicy::default(),
            metrics: BridgeMetrics,
        }
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: PublishFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl<P: RecordPublisher> JobHandler for PublishJobHandler<P> {
    async fn handle(&self, job: &ActivatedJob) -> Result<(), JobError> {
        let (message, variables) = match OutboundMessage::for_job(job) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(job_key = job.key, error = %e, "Job payload is invalid, not publishing");
                self.metrics.job_handled("invalid");
                return Err(JobError::abandon(e.to_string()));
            }
        };

        info!(
            job_key = job.key,
            message_type = %message.key,
            variable_key = %variables.key,
            "Working on job"
        );

        let report = publish_confirmed(
            &self.publisher,
            &self.topic,
            message.into(),
            self.ack_timeout,
            &self.metrics,
        )
        .await;

        let Some(failure) = report.failure() else {
            self.metrics.job_handled("published");
            return Ok(());
        };

        self.metrics.job_handled("publish_failed");
        match self.failure_policy {
            PublishFailurePolicy::FailJob => Err(JobError::fail(format!(
                "failed to publish record for job {} to {}: {failure}",
                job.key, self.topic
            ))),
            PublishFailurePolicy::LogOnly => {
                warn!(
                    job_key = job.key,
                    topic = %self.topic,
                    error = %failure,
                    "Record not published, job left to its lease timeout"
                );
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        "publish"
    }
}
