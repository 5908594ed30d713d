//! Publisher trait.

use crate::record::{DeliveryReport, OutboundRecord};
use async_trait::async_trait;

/// Publishes keyed records to a topic.
///
/// Implementations are shared across concurrently running tasks. A call
/// resolves once the broker has confirmed or refused the record, so the
/// returned report is the single delivery acknowledgment for that publish.
/// Transport errors are folded into [`DeliveryReport::failed`].
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    async fn publish(&self, topic: &str, record: OutboundRecord) -> DeliveryReport;
}

#[async_trait]
impl<P> RecordPublisher for std::sync::Arc<P>
where
    P: RecordPublisher + ?Sized,
{
    async fn publish(&self, topic: &str, record: OutboundRecord) -> DeliveryReport {
        (**self).publish(topic, record).await
    }
}
