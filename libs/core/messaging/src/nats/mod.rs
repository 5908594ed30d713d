//! NATS JetStream backend.
//!
//! ```text
//! ┌────────────────┐     ┌─────────────────────┐     ┌──────────────────┐
//! │ NatsPublisher  │────▶│   NATS JetStream    │────▶│ NatsSubscription │
//! │ (publish + ack)│     │   (durable stream)  │     │ (durable pull)   │
//! └────────────────┘     └─────────────────────┘     └──────────────────┘
//! ```
//!
//! Record keys travel in the [`RECORD_KEY_HEADER`] header, values in the
//! payload. A topic maps to one subject inside one stream.
//!
//! ```rust,ignore
//! struct OrdersStream;
//! impl StreamConfig for OrdersStream {
//!     const STREAM_NAME: &'static str = "ORDERS";
//!     const SUBJECT: &'static str = "orders";
//!     const CONSUMER_NAME: &'static str = "orders-completer";
//! }
//!
//! let jetstream = async_nats::jetstream::new(client);
//! let publisher = NatsPublisher::new(jetstream.clone());
//! publisher.ensure_stream(&TopicConfig::from_stream::<OrdersStream>()).await?;
//! let subscription = NatsSubscription::subscribe(
//!     &jetstream,
//!     SubscriptionConfig::from_stream::<OrdersStream>(),
//! ).await?;
//! ```

mod config;
mod consumer;
mod health;
pub mod metrics;
mod producer;

pub use config::{StreamConfig, SubscriptionConfig, TopicConfig};
pub use consumer::NatsSubscription;
pub use health::{HealthServer, HealthState, HealthStatus};
pub use metrics::{init_metrics, BrokerMetrics};
pub use producer::NatsPublisher;

/// Header carrying the record key.
pub const RECORD_KEY_HEADER: &str = "Record-Key";

/// Connect to a NATS server.
pub async fn connect(url: &str, client_name: Option<&str>) -> Result<async_nats::Client, crate::BrokerError> {
    let mut options = async_nats::ConnectOptions::new();
    if let Some(name) = client_name {
        options = options.name(name);
    }

    options
        .connect(url)
        .await
        .map_err(|e| crate::BrokerError::Connection(format!("{url}: {e}")))
}
