//! NATS JetStream durable pull subscription.

use super::config::SubscriptionConfig;
use super::metrics::BrokerMetrics;
use super::RECORD_KEY_HEADER;
use crate::error::BrokerError;
use crate::record::InboundRecord;
use crate::subscription::RecordSubscription;
use async_nats::jetstream::consumer::pull::{Config as PullConfig, Stream as PullStream};
use async_nats::jetstream::consumer::{AckPolicy, DeliverPolicy};
use async_nats::jetstream::stream::Config as JetStreamConfig;
use async_nats::jetstream::{AckKind, Context, Message};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

/// A durable pull consumer read one record at a time.
///
/// On first use the consumer starts at the earliest retained record; after
/// that it resumes from the last committed one. Pulls fetch a single record,
/// so the ack wait of a record only starts once the previous one is done.
pub struct NatsSubscription {
    topic: String,
    durable_name: String,
    messages: PullStream,
    pending: Option<Message>,
    metrics: BrokerMetrics,
}

impl NatsSubscription {
    /// Ensure the stream and durable consumer exist and start pulling.
    pub async fn subscribe(jetstream: &Context, config: SubscriptionConfig) -> Result<Self, BrokerError> {
        let stream = jetstream
            .get_or_create_stream(JetStreamConfig {
                name: config.topic.stream_name.clone(),
                subjects: vec![config.topic.subject.clone()],
                max_age: config.topic.max_age,
                max_messages: config.topic.max_messages,
                ..Default::default()
            })
            .await
            .map_err(BrokerError::stream)?;

        let consumer = stream
            .get_or_create_consumer(
                &config.durable_name,
                PullConfig {
                    durable_name: Some(config.durable_name.clone()),
                    deliver_policy: DeliverPolicy::All,
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: config.ack_wait,
                    max_deliver: config.max_deliver,
                    filter_subject: config.topic.subject.clone(),
                    ..Default::default()
                },
            )
            .await
            .map_err(BrokerError::stream)?;

        let messages = consumer
            .stream()
            .max_messages_per_batch(1)
            .messages()
            .await
            .map_err(BrokerError::consumer)?;

        info!(
            stream = %config.topic.stream_name,
            topic = %config.topic.subject,
            consumer = %config.durable_name,
            ack_wait_ms = config.ack_wait.as_millis() as u64,
            "Subscribed"
        );

        Ok(Self {
            topic: config.topic.subject,
            durable_name: config.durable_name,
            messages,
            pending: None,
            metrics: BrokerMetrics::new("subscription"),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn to_record(&self, message: &Message) -> InboundRecord {
        let (sequence, delivery_count) = match message.info() {
            Ok(info) => (info.stream_sequence, info.delivered.max(1) as u64),
            Err(e) => {
                warn!(error = %e, "Failed to read message info, using defaults");
                (0, 1)
            }
        };

        let key = message
            .headers
            .as_ref()
            .and_then(|headers| headers.get(RECORD_KEY_HEADER))
            .map(|value| value.as_str().to_string());

        InboundRecord {
            topic: message.subject.to_string(),
            key,
            value: String::from_utf8_lossy(&message.payload).into_owned(),
            sequence,
            delivery_count,
        }
    }
}

#[async_trait]
impl RecordSubscription for NatsSubscription {
    async fn next(&mut self) -> Result<Option<InboundRecord>, BrokerError> {
        if let Some(previous) = self.pending.take() {
            // Pulled past an uncommitted record: hand it back for redelivery.
            warn!(topic = %self.topic, "Previous record was not committed, requesting redelivery");
            if let Err(e) = previous.ack_with(AckKind::Nak(None)).await {
                warn!(error = %e, "Failed to nak uncommitted record");
            }
        }

        match self.messages.next().await {
            None => Ok(None),
            Some(Err(e)) => Err(BrokerError::consumer(e)),
            Some(Ok(message)) => {
                let record = self.to_record(&message);
                self.metrics.record_consumed(&self.topic, record.is_redelivery());
                self.pending = Some(message);
                Ok(Some(record))
            }
        }
    }

    async fn commit(&mut self, record: &InboundRecord) -> Result<(), BrokerError> {
        let message = match self.pending.take() {
            Some(message) => message,
            None => return Err(BrokerError::NotPending { sequence: record.sequence }),
        };

        let pending_sequence = message.info().map(|info| info.stream_sequence).unwrap_or(0);
        if pending_sequence != record.sequence {
            self.pending = Some(message);
            return Err(BrokerError::NotPending { sequence: record.sequence });
        }

        message.ack().await.map_err(BrokerError::consumer)?;
        debug!(topic = %self.topic, sequence = record.sequence, "Committed record");
        Ok(())
    }

    async fn keep_alive(&mut self, record: &InboundRecord) -> Result<(), BrokerError> {
        let message = match self.pending.as_ref() {
            Some(message) if message.info().map(|info| info.stream_sequence).ok() == Some(record.sequence) => {
                message
            }
            _ => return Err(BrokerError::NotPending { sequence: record.sequence }),
        };

        message
            .ack_with(AckKind::Progress)
            .await
            .map_err(BrokerError::consumer)?;
        debug!(topic = %self.topic, sequence = record.sequence, "Extended ack wait");
        Ok(())
    }

    async fn close(mut self) -> Result<(), BrokerError> {
        if let Some(message) = self.pending.take() {
            message
                .ack_with(AckKind::Nak(None))
                .await
                .map_err(BrokerError::consumer)?;
        }

        info!(topic = %self.topic, consumer = %self.durable_name, "Subscription closed");
        Ok(())
    }
}
