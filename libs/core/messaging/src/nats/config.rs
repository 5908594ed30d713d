//! Stream and subscription configuration for NATS JetStream.

use std::time::Duration;

/// Stream definition trait (type-safe constants).
///
/// ```rust,ignore
/// struct OrdersStream;
///
/// impl StreamConfig for OrdersStream {
///     const STREAM_NAME: &'static str = "ORDERS";
///     const SUBJECT: &'static str = "orders";
///     const CONSUMER_NAME: &'static str = "orders-completer";
/// }
/// ```
pub trait StreamConfig {
    /// JetStream stream name (e.g., "ORDERS")
    const STREAM_NAME: &'static str;

    /// Subject records are published on; doubles as the topic name
    const SUBJECT: &'static str;

    /// Durable consumer name
    const CONSUMER_NAME: &'static str;

    /// Ack wait timeout in seconds (default: 30)
    const ACK_WAIT_SECS: u64 = 30;

    /// Maximum deliveries per record, -1 for unlimited (default: -1)
    const MAX_DELIVER: i64 = -1;

    /// Retention in seconds (default: 7 days)
    const MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

    /// Maximum retained records (default: 100,000)
    const MAX_MESSAGES: i64 = 100_000;
}

/// Stream settings used when ensuring a topic exists.
#[derive(Debug, Clone)]
pub struct TopicConfig {
    pub stream_name: String,
    pub subject: String,
    pub max_age: Duration,
    pub max_messages: i64,
}

impl TopicConfig {
    /// Derive a stream for a bare topic name (`vacation` → stream `VACATION`).
    pub fn new(topic: impl Into<String>) -> Self {
        let subject = topic.into();
        let stream_name = subject
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        Self {
            stream_name,
            subject,
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
            max_messages: 100_000,
        }
    }

    pub fn from_stream<S: StreamConfig>() -> Self {
        Self {
            stream_name: S::STREAM_NAME.to_string(),
            subject: S::SUBJECT.to_string(),
            max_age: Duration::from_secs(S::MAX_AGE_SECS),
            max_messages: S::MAX_MESSAGES,
        }
    }

    pub fn with_stream_name(mut self, name: impl Into<String>) -> Self {
        self.stream_name = name.into();
        self
    }
}

/// Durable pull consumer settings.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub topic: TopicConfig,
    /// Durable name; the consumer resumes from its last committed position
    pub durable_name: String,
    pub ack_wait: Duration,
    pub max_deliver: i64,
}

impl SubscriptionConfig {
    pub fn new(topic: TopicConfig, durable_name: impl Into<String>) -> Self {
        Self {
            topic,
            durable_name: durable_name.into(),
            ack_wait: Duration::from_secs(30),
            max_deliver: -1,
        }
    }

    pub fn from_stream<S: StreamConfig>() -> Self {
        Self {
            topic: TopicConfig::from_stream::<S>(),
            durable_name: S::CONSUMER_NAME.to_string(),
            ack_wait: Duration::from_secs(S::ACK_WAIT_SECS),
            max_deliver: S::MAX_DELIVER,
        }
    }

    pub fn with_durable_name(mut self, name: impl Into<String>) -> Self {
        self.durable_name = name.into();
        self
    }

    pub fn with_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = ack_wait;
        self
    }
}
