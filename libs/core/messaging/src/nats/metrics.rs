//! Prometheus metrics for the NATS backend.

use crate::record::DeliveryStatus;
use metrics::{counter, histogram};
use std::time::Duration;

/// Broker-level counters, labelled by role (`publisher` / `subscription`).
#[derive(Clone)]
pub struct BrokerMetrics {
    role: &'static str,
}

impl BrokerMetrics {
    pub fn new(role: &'static str) -> Self {
        Self { role }
    }

    /// Record a resolved publish.
    pub fn record_published(&self, topic: &str, status: &DeliveryStatus, latency: Duration) {
        let status = match status {
            DeliveryStatus::Delivered { duplicate: true, .. } => "duplicate",
            DeliveryStatus::Delivered { .. } => "delivered",
            DeliveryStatus::Failed(_) => "failed",
        };

        counter!(
            "broker_records_published_total",
            "role" => self.role,
            "topic" => topic.to_string(),
            "status" => status
        )
        .increment(1);

        histogram!(
            "broker_publish_ack_seconds",
            "topic" => topic.to_string()
        )
        .record(latency.as_secs_f64());
    }

    /// Record a record pulled from a subscription.
    pub fn record_consumed(&self, topic: &str, redelivery: bool) {
        counter!(
            "broker_records_consumed_total",
            "role" => self.role,
            "topic" => topic.to_string(),
            "redelivery" => if redelivery { "true" } else { "false" }
        )
        .increment(1);
    }
}

/// Initialize Prometheus metrics.
pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}
