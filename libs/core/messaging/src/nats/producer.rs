//! NATS JetStream publisher.

use super::config::TopicConfig;
use super::metrics::BrokerMetrics;
use super::RECORD_KEY_HEADER;
use crate::error::BrokerError;
use crate::publisher::RecordPublisher;
use crate::record::{DeliveryFailure, DeliveryReport, DeliveryStatus, OutboundRecord};
use async_nats::jetstream::context::{PublishError, PublishErrorKind};
use async_nats::jetstream::stream::Config as JetStreamConfig;
use async_nats::jetstream::Context;
use async_nats::HeaderMap;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info};

/// Publishes records to JetStream and waits for the stream's acknowledgment.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct NatsPublisher {
    jetstream: Context,
    metrics: BrokerMetrics,
}

impl NatsPublisher {
    pub fn new(jetstream: Context) -> Self {
        Self {
            jetstream,
            metrics: BrokerMetrics::new("publisher"),
        }
    }

    /// Ensure the stream backing `topic` exists, creating it if necessary.
    pub async fn ensure_stream(&self, topic: &TopicConfig) -> Result<(), BrokerError> {
        let mut stream = self
            .jetstream
            .get_or_create_stream(JetStreamConfig {
                name: topic.stream_name.clone(),
                subjects: vec![topic.subject.clone()],
                max_age: topic.max_age,
                max_messages: topic.max_messages,
                ..Default::default()
            })
            .await
            .map_err(BrokerError::stream)?;

        let info = stream.info().await.map_err(BrokerError::stream)?;
        info!(
            stream = %topic.stream_name,
            subject = %topic.subject,
            messages = info.state.messages,
            "Stream ready"
        );

        Ok(())
    }

    async fn send(&self, topic: &str, record: &OutboundRecord) -> DeliveryStatus {
        let mut headers = HeaderMap::new();
        headers.insert(RECORD_KEY_HEADER, record.key.as_str());

        let ack_future = match self
            .jetstream
            .publish_with_headers(topic.to_string(), headers, record.value.clone().into())
            .await
        {
            Ok(future) => future,
            Err(e) => return DeliveryStatus::Failed(failure_from(e)),
        };

        match ack_future.await {
            Ok(ack) => DeliveryStatus::Delivered {
                sequence: ack.sequence,
                duplicate: ack.duplicate,
            },
            Err(e) => DeliveryStatus::Failed(failure_from(e)),
        }
    }
}

#[async_trait]
impl RecordPublisher for NatsPublisher {
    async fn publish(&self, topic: &str, record: OutboundRecord) -> DeliveryReport {
        let started = Instant::now();
        let status = self.send(topic, &record).await;
        self.metrics.record_published(topic, &status, started.elapsed());

        debug!(
            topic = %topic,
            key = %record.key,
            value = %record.value,
            status = ?status,
            "Publish resolved"
        );

        DeliveryReport {
            topic: topic.to_string(),
            record,
            status,
        }
    }
}

fn failure_from(error: PublishError) -> DeliveryFailure {
    match error.kind() {
        PublishErrorKind::BrokenPipe => DeliveryFailure::Disconnected(error.to_string()),
        _ => DeliveryFailure::Rejected(error.to_string()),
    }
}
