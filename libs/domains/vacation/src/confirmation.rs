//! Publish with a bounded wait for the broker's acknowledgment.

use crate::metrics::BridgeMetrics;
use messaging::{DeliveryFailure, DeliveryReport, DeliveryStatus, OutboundRecord, RecordPublisher};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Default wait for a publish acknowledgment.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Publish `record` and wait at most `ack_timeout` for its report.
///
/// Always yields exactly one report. An elapsed wait is reported as
/// [`DeliveryFailure::TimedOut`]; nothing is retried here.
pub async fn publish_confirmed<P>(
    publisher: &P,
    topic: &str,
    record: OutboundRecord,
    ack_timeout: Duration,
    metrics: &BridgeMetrics,
) -> DeliveryReport
where
    P: RecordPublisher + ?Sized,
{
    let started = Instant::now();
    let report = match tokio::time::timeout(ack_timeout, publisher.publish(topic, record.clone())).await {
        Ok(report) => report,
        Err(_) => DeliveryReport::failed(topic, record, DeliveryFailure::TimedOut(ack_timeout)),
    };

    metrics.message_published(report.is_delivered(), started.elapsed());
    log_report(&report);
    report
}

/// Log a delivery report: `info` when delivered, `warn` otherwise.
pub fn log_report(report: &DeliveryReport) {
    match &report.status {
        DeliveryStatus::Delivered { sequence, duplicate } => info!(
            topic = %report.topic,
            key = %report.record.key,
            value = %report.record.value,
            sequence,
            duplicate,
            "Message published"
        ),
        DeliveryStatus::Failed(failure) => warn!(
            topic = %report.topic,
            key = %report.record.key,
            value = %report.record.value,
            error = %failure,
            "Message delivery failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AckingPublisher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecordPublisher for AckingPublisher {
        async fn publish(&self, topic: &str, record: OutboundRecord) -> DeliveryReport {
            let sequence = self.calls.fetch_add(1, Ordering::SeqCst) as u64 + 1;
            DeliveryReport::delivered(topic, record, sequence)
        }
    }

    struct SilentPublisher;

    #[async_trait]
    impl RecordPublisher for SilentPublisher {
        async fn publish(&self, _topic: &str, _record: OutboundRecord) -> DeliveryReport {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_delivered_report_passed_through() {
        let publisher = AckingPublisher {
            calls: AtomicUsize::new(0),
        };
        let report = publish_confirmed(
            &publisher,
            "vacation",
            OutboundRecord::new("alert", "42"),
            DEFAULT_ACK_TIMEOUT,
            &BridgeMetrics,
        )
        .await;

        assert!(report.is_delivered());
        assert_eq!(report.record, OutboundRecord::new("alert", "42"));
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_ack_becomes_timeout() {
        let report = publish_confirmed(
            &SilentPublisher,
            "vacation",
            OutboundRecord::new("alert", "42"),
            Duration::from_secs(10),
            &BridgeMetrics,
        )
        .await;

        assert_eq!(
            report.failure(),
            Some(&DeliveryFailure::TimedOut(Duration::from_secs(10)))
        );
        assert_eq!(report.topic, "vacation");
        assert_eq!(report.record.value, "42");
    }
}
