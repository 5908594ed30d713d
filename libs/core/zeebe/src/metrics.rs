//! Prometheus metrics for job workers.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

#[derive(Clone)]
pub struct WorkerMetrics {
    job_type: String,
}

impl WorkerMetrics {
    pub fn new(job_type: &str) -> Self {
        Self {
            job_type: job_type.to_string(),
        }
    }

    pub fn jobs_activated(&self, count: usize) {
        counter!("zeebe_worker_jobs_activated_total", "job_type" => self.job_type.clone())
            .increment(count as u64);
    }

    /// `outcome`: deferred, completed, failed, abandoned, panicked
    pub fn job_handled(&self, outcome: &'static str, duration: Duration) {
        counter!(
            "zeebe_worker_jobs_handled_total",
            "job_type" => self.job_type.clone(),
            "outcome" => outcome
        )
        .increment(1);

        histogram!(
            "zeebe_worker_handler_duration_seconds",
            "job_type" => self.job_type.clone()
        )
        .record(duration.as_secs_f64());
    }

    pub fn activation_failed(&self) {
        counter!("zeebe_worker_activation_errors_total", "job_type" => self.job_type.clone())
            .increment(1);
    }

    pub fn in_flight(&self, count: usize) {
        gauge!("zeebe_worker_jobs_in_flight", "job_type" => self.job_type.clone()).set(count as f64);
    }
}
