//! Broker-agnostic messaging primitives for keyed records.
//!
//! Producers hand an [`OutboundRecord`] to a [`RecordPublisher`] and always get
//! back exactly one [`DeliveryReport`]. Consumers own a [`RecordSubscription`],
//! pull [`InboundRecord`]s one at a time, commit them once handled and release
//! the subscription with [`RecordSubscription::close`].
//!
//! ```text
//! ┌──────────────┐  publish   ┌──────────────────┐  next/commit  ┌──────────────┐
//! │  Publisher   │──────────▶│      Broker      │──────────────▶│ Subscription │
//! │ (any task)   │◀──────────│ (NATS JetStream) │               │ (one owner)  │
//! └──────────────┘  report    └──────────────────┘               └──────────────┘
//! ```
//!
//! The NATS JetStream backend lives behind the `nats` feature.

mod config;
mod error;
mod publisher;
mod record;
mod subscription;

#[cfg(feature = "nats")]
pub mod nats;

pub use config::{BackoffStrategy, RetryPolicy};
pub use error::{BrokerError, ErrorCategory};
pub use publisher::RecordPublisher;
pub use record::{DeliveryFailure, DeliveryReport, DeliveryStatus, InboundRecord, OutboundRecord};
pub use subscription::RecordSubscription;
