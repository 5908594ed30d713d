//! Bridge metrics.

use metrics::{counter, histogram};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct BridgeMetrics;

impl BridgeMetrics {
    /// `outcome`: published, publish_failed, invalid
    pub fn job_handled(&self, outcome: &'static str) {
        counter!("bridge_jobs_handled_total", "outcome" => outcome).increment(1);
    }

    pub fn message_published(&self, delivered: bool, ack_latency: Duration) {
        let status = if delivered { "delivered" } else { "failed" };
        counter!("bridge_messages_published_total", "status" => status).increment(1);
        histogram!("bridge_publish_ack_seconds").record(ack_latency.as_secs_f64());
    }

    pub fn record_consumed(&self) {
        counter!("bridge_records_consumed_total").increment(1);
    }

    pub fn record_malformed(&self) {
        counter!("bridge_records_malformed_total").increment(1);
    }

    /// `outcome`: completed, stale, failed
    pub fn completion(&self, outcome: &'static str) {
        counter!("bridge_completions_total", "outcome" => outcome).increment(1);
    }
}
