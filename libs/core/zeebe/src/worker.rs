//! Job worker: polls the gateway for jobs of one type and runs a handler per job.
//!
//! The worker holds one semaphore permit per leased job, so at most
//! `max_jobs_active` handlers run at once and each activation asks for no
//! more jobs than there are free permits. What happens to a job after its
//! handler returns is decided by the handler's result:
//!
//! | handler result          | command sent                          |
//! |-------------------------|---------------------------------------|
//! | `Ok(())`                | none, or CompleteJob with auto-complete |
//! | `Err(JobError::Fail)`   | FailJob with `retries - 1`            |
//! | `Err(JobError::Abandon)`| none, the lease times out             |

use crate::client::{ActivateJobs, JobClient};
use crate::error::ZeebeResult;
use crate::job::ActivatedJob;
use crate::metrics::WorkerMetrics;
use async_trait::async_trait;
use futures::FutureExt;
use messaging::BackoffStrategy;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Why a handler gave up on a job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Report the failure to the engine so it can retry the job.
    #[error("{message}")]
    Fail {
        message: String,
        /// Retries to report; `None` decrements the job's current count
        retries: Option<i32>,
    },

    /// Leave the job alone; the engine reclaims it when the lease expires.
    #[error("{message}")]
    Abandon { message: String },
}

impl JobError {
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
            retries: None,
        }
    }

    pub fn abandon(message: impl Into<String>) -> Self {
        Self::Abandon {
            message: message.into(),
        }
    }
}

/// Work done for each activated job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &ActivatedJob) -> Result<(), JobError>;

    /// Handler name for logs
    fn name(&self) -> &'static str;
}

/// Worker registration settings.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    pub job_type: String,
    /// Name reported to the engine as the job's owner
    pub worker_name: String,
    /// Upper bound on leased, unfinished jobs
    pub max_jobs_active: usize,
    /// Wait after an activation that returned nothing
    pub poll_interval: Duration,
    /// Lease length per job
    pub timeout: Duration,
    /// Long-poll duration of one activation call
    pub request_timeout: Duration,
    pub fetch_variables: Vec<String>,
    /// Complete jobs whose handler returned `Ok`
    pub auto_complete: bool,
    /// Delay after failed activations
    pub error_backoff: BackoffStrategy,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            job_type: "default".to_string(),
            worker_name: format!("worker-{}", uuid::Uuid::new_v4()),
            max_jobs_active: 5,
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            fetch_variables: Vec::new(),
            auto_complete: false,
            error_backoff: BackoffStrategy::Exponential {
                base: Duration::from_secs(1),
                max: Duration::from_secs(30),
            },
        }
    }
}

impl JobWorkerConfig {
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            ..Default::default()
        }
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn with_max_jobs_active(mut self, max: usize) -> Self {
        self.max_jobs_active = max.max(1);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_fetch_variables(mut self, variables: Vec<String>) -> Self {
        self.fetch_variables = variables;
        self
    }

    pub fn with_auto_complete(mut self, enabled: bool) -> Self {
        self.auto_complete = enabled;
        self
    }

    pub fn with_error_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.error_backoff = backoff;
        self
    }

    fn activate_request(&self, capacity: usize) -> ActivateJobs {
        ActivateJobs {
            job_type: self.job_type.clone(),
            worker: self.worker_name.clone(),
            timeout: self.timeout,
            max_jobs: u32::try_from(capacity).unwrap_or(u32::MAX),
            request_timeout: self.request_timeout,
            fetch_variables: self.fetch_variables.clone(),
        }
    }
}

/// Polls for jobs and runs them through a [`JobHandler`] with bounded concurrency.
pub struct JobWorker<C, H>
where
    C: JobClient,
    H: JobHandler,
{
    client: Arc<C>,
    handler: Arc<H>,
    config: JobWorkerConfig,
    permits: Arc<Semaphore>,
    metrics: WorkerMetrics,
}

impl<C, H> JobWorker<C, H>
where
    C: JobClient + 'static,
    H: JobHandler + 'static,
{
    pub fn new(client: Arc<C>, handler: Arc<H>, config: JobWorkerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_jobs_active));
        let metrics = WorkerMetrics::new(&config.job_type);

        Self {
            client,
            handler,
            config,
            permits,
            metrics,
        }
    }

    pub fn config(&self) -> &JobWorkerConfig {
        &self.config
    }

    /// Jobs currently held by handlers.
    pub fn in_flight(&self) -> usize {
        self.config.max_jobs_active - self.permits.available_permits()
    }

    /// Run until `shutdown` flips to `true`, then drain in-flight handlers.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> ZeebeResult<()> {
        info!(
            job_type = %self.config.job_type,
            worker = %self.config.worker_name,
            handler = %self.handler.name(),
            max_jobs_active = self.config.max_jobs_active,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "Starting job worker"
        );

        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut consecutive_errors: u32 = 0;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping job worker");
                break;
            }

            while in_flight.try_join_next().is_some() {}

            let capacity = self.permits.available_permits();
            if capacity == 0 {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    Some(_) = in_flight.join_next() => {}
                }
                continue;
            }

            let request = self.config.activate_request(capacity);
            let activated = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                result = self.client.activate_jobs(request) => result,
            };

            match activated {
                Ok(jobs) if jobs.is_empty() => {
                    consecutive_errors = 0;
                    if wait_or_shutdown(&mut shutdown, self.config.poll_interval).await {
                        break;
                    }
                }
                Ok(jobs) => {
                    if consecutive_errors > 0 {
                        info!(errors = consecutive_errors, "Job activation recovered");
                        consecutive_errors = 0;
                    }

                    debug!(count = jobs.len(), capacity, "Activated jobs");
                    self.metrics.jobs_activated(jobs.len());

                    for job in jobs {
                        self.dispatch(job, &mut in_flight).await;
                    }
                    self.metrics.in_flight(self.in_flight());
                }
                Err(e) => {
                    consecutive_errors += 1;
                    self.metrics.activation_failed();
                    let delay = self.config.error_backoff.delay(consecutive_errors - 1);
                    warn!(
                        error = %e,
                        category = %e.category(),
                        consecutive_errors,
                        backoff_ms = delay.as_millis() as u64,
                        "Job activation failed, backing off"
                    );
                    if wait_or_shutdown(&mut shutdown, delay).await {
                        break;
                    }
                }
            }
        }

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "Waiting for in-flight jobs");
        }
        while in_flight.join_next().await.is_some() {}

        info!(job_type = %self.config.job_type, "Job worker stopped");
        Ok(())
    }

    async fn dispatch(&self, job: ActivatedJob, in_flight: &mut JoinSet<()>) {
        let Ok(permit) = self.permits.clone().acquire_owned().await else {
            error!(job_key = job.key, "Job permits closed, leaving job to time out");
            return;
        };

        let client = Arc::clone(&self.client);
        let handler = Arc::clone(&self.handler);
        let auto_complete = self.config.auto_complete;
        let metrics = self.metrics.clone();

        in_flight.spawn(async move {
            let _permit = permit;
            execute(client.as_ref(), handler.as_ref(), job, auto_complete, &metrics).await;
        });
    }
}

/// Run one job through the handler and send the resulting command.
async fn execute<C, H>(client: &C, handler: &H, job: ActivatedJob, auto_complete: bool, metrics: &WorkerMetrics)
where
    C: JobClient + ?Sized,
    H: JobHandler + ?Sized,
{
    let started = Instant::now();
    debug!(
        job_key = job.key,
        job_type = %job.job_type,
        retries = job.retries,
        handler = %handler.name(),
        "Handling job"
    );

    let result = AssertUnwindSafe(handler.handle(&job)).catch_unwind().await;

    let outcome = match result {
        Ok(Ok(())) if auto_complete => match client.complete_job(job.key, None).await {
            Ok(()) => {
                debug!(job_key = job.key, "Job completed");
                "completed"
            }
            Err(e) => {
                warn!(job_key = job.key, error = %e, "Failed to complete job");
                "failed"
            }
        },
        Ok(Ok(())) => {
            debug!(job_key = job.key, "Handler finished, job stays open");
            "deferred"
        }
        Ok(Err(JobError::Fail { message, retries })) => {
            let retries = retries.unwrap_or(job.retries - 1).max(0);
            match client.fail_job(job.key, retries, message.clone()).await {
                Ok(()) => warn!(job_key = job.key, retries, error = %message, "Job failed"),
                Err(e) => error!(
                    job_key = job.key,
                    error = %e,
                    reason = %message,
                    "Failed to fail job, lease will expire"
                ),
            }
            "failed"
        }
        Ok(Err(JobError::Abandon { message })) => {
            warn!(job_key = job.key, reason = %message, "Job abandoned, lease will expire");
            "abandoned"
        }
        Err(_) => {
            error!(job_key = job.key, "Handler panicked, lease will expire");
            "panicked"
        }
    };

    metrics.job_handled(outcome, started.elapsed());
}

/// Sleep for `delay` unless shutdown is requested first. Returns `true` on shutdown.
async fn wait_or_shutdown(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
        _ = tokio::time::sleep(delay) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockJobClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn job(key: i64, retries: i32) -> ActivatedJob {
        ActivatedJob {
            key,
            job_type: "put".into(),
            process_instance_key: 1,
            bpmn_process_id: "vacation8".into(),
            element_id: "publish".into(),
            custom_headers: "{}".into(),
            worker: "test".into(),
            retries,
            deadline: 0,
            variables: "{}".into(),
        }
    }

    fn config() -> JobWorkerConfig {
        JobWorkerConfig::new("put")
            .with_worker_name("test-worker")
            .with_poll_interval(Duration::from_millis(5))
    }

    /// Client that hands out `jobs` once, then nothing.
    fn client_with(jobs: Vec<ActivatedJob>) -> MockJobClient {
        let mut client = MockJobClient::new();
        let calls = AtomicUsize::new(0);
        client.expect_activate_jobs().returning(move |request| {
            assert!(request.max_jobs as usize <= 5);
            assert_eq!(request.job_type, "put");
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(jobs.clone())
            } else {
                Ok(Vec::new())
            }
        });
        client
    }

    async fn run_until_stopped<C: JobClient + 'static, H: JobHandler + 'static>(
        worker: JobWorker<C, H>,
        shutdown: watch::Receiver<bool>,
    ) {
        tokio::time::timeout(Duration::from_secs(5), worker.run(shutdown))
            .await
            .expect("worker did not stop")
            .expect("worker failed");
    }

    #[test]
    fn test_config_defaults() {
        let config = JobWorkerConfig::new("put");
        assert_eq!(config.max_jobs_active, 5);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.auto_complete);
        assert!(config.worker_name.starts_with("worker-"));

        let request = config.activate_request(3);
        assert_eq!(request.max_jobs, 3);
        assert_eq!(request.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_deferred_job_is_left_open() {
        let (tx, rx) = watch::channel(false);
        let mut client = client_with(vec![job(42, 3)]);
        client.expect_complete_job().never();
        client.expect_fail_job().never();

        let mut handler = MockJobHandler::new();
        handler.expect_name().return_const("test");
        handler
            .expect_handle()
            .withf(|job| job.key == 42)
            .times(1)
            .returning(move |_| {
                let _ = tx.send(true);
                Ok(())
            });

        let worker = JobWorker::new(Arc::new(client), Arc::new(handler), config());
        run_until_stopped(worker, rx).await;
    }

    #[tokio::test]
    async fn test_fail_reports_decremented_retries() {
        let (tx, rx) = watch::channel(false);
        let mut client = client_with(vec![job(42, 3)]);
        client.expect_complete_job().never();
        client
            .expect_fail_job()
            .withf(|key, retries, message| *key == 42 && *retries == 2 && message == "broker down")
            .times(1)
            .returning(move |_, _, _| {
                let _ = tx.send(true);
                Ok(())
            });

        let mut handler = MockJobHandler::new();
        handler.expect_name().return_const("test");
        handler
            .expect_handle()
            .times(1)
            .returning(|_| Err(JobError::fail("broker down")));

        let worker = JobWorker::new(Arc::new(client), Arc::new(handler), config());
        run_until_stopped(worker, rx).await;
    }

    #[tokio::test]
    async fn test_fail_never_reports_negative_retries() {
        let (tx, rx) = watch::channel(false);
        let mut client = client_with(vec![job(7, 0)]);
        client
            .expect_fail_job()
            .withf(|key, retries, _| *key == 7 && *retries == 0)
            .times(1)
            .returning(move |_, _, _| {
                let _ = tx.send(true);
                Ok(())
            });

        let mut handler = MockJobHandler::new();
        handler.expect_name().return_const("test");
        handler
            .expect_handle()
            .returning(|_| Err(JobError::fail("still broken")));

        let worker = JobWorker::new(Arc::new(client), Arc::new(handler), config());
        run_until_stopped(worker, rx).await;
    }

    #[tokio::test]
    async fn test_abandon_sends_no_command() {
        let (tx, rx) = watch::channel(false);
        let mut client = client_with(vec![job(42, 3)]);
        client.expect_complete_job().never();
        client.expect_fail_job().never();

        let mut handler = MockJobHandler::new();
        handler.expect_name().return_const("test");
        handler.expect_handle().times(1).returning(move |_| {
            let _ = tx.send(true);
            Err(JobError::abandon("variables are not an object"))
        });

        let worker = JobWorker::new(Arc::new(client), Arc::new(handler), config());
        run_until_stopped(worker, rx).await;
    }

    #[tokio::test]
    async fn test_auto_complete_completes_on_success() {
        let (tx, rx) = watch::channel(false);
        let mut client = client_with(vec![job(42, 3)]);
        client
            .expect_complete_job()
            .withf(|key, variables| *key == 42 && variables.is_none())
            .times(1)
            .returning(move |_, _| {
                let _ = tx.send(true);
                Ok(())
            });
        client.expect_fail_job().never();

        let mut handler = MockJobHandler::new();
        handler.expect_name().return_const("test");
        handler.expect_handle().times(1).returning(|_| Ok(()));

        let worker = JobWorker::new(
            Arc::new(client),
            Arc::new(handler),
            config().with_auto_complete(true),
        );
        run_until_stopped(worker, rx).await;
    }

    struct SlowHandler {
        running: AtomicUsize,
        peak: AtomicUsize,
        handled: AtomicUsize,
        stop_after: usize,
        shutdown: watch::Sender<bool>,
    }

    #[async_trait]
    impl JobHandler for SlowHandler {
        async fn handle(&self, _job: &ActivatedJob) -> Result<(), JobError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            if self.handled.fetch_add(1, Ordering::SeqCst) + 1 == self.stop_after {
                let _ = self.shutdown.send(true);
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_never_exceeds_max_jobs_active() {
        let (tx, rx) = watch::channel(false);
        let next_key = Arc::new(AtomicUsize::new(1));

        let mut client = MockJobClient::new();
        let keys = Arc::clone(&next_key);
        client.expect_activate_jobs().returning(move |request| {
            assert!(request.max_jobs <= 2, "asked for {} jobs", request.max_jobs);
            Ok((0..request.max_jobs)
                .map(|_| job(keys.fetch_add(1, Ordering::SeqCst) as i64, 3))
                .collect())
        });

        let handler = Arc::new(SlowHandler {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            handled: AtomicUsize::new(0),
            stop_after: 6,
            shutdown: tx,
        });

        let worker = JobWorker::new(
            Arc::new(client),
            Arc::clone(&handler),
            config().with_max_jobs_active(2),
        );
        run_until_stopped(worker, rx).await;

        assert!(handler.peak.load(Ordering::SeqCst) <= 2);
        assert!(handler.handled.load(Ordering::SeqCst) >= 6);
        assert_eq!(handler.running.load(Ordering::SeqCst), 0);
    }
}
