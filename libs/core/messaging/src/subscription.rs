//! Subscription trait.

use crate::error::BrokerError;
use crate::record::InboundRecord;
use async_trait::async_trait;

/// An exclusively owned, sequential view of a topic.
///
/// At most one record is pending at a time: after [`next`](Self::next)
/// returns a record, the caller commits it before pulling the next one.
/// Uncommitted records are redelivered after a restart.
#[async_trait]
pub trait RecordSubscription: Send {
    /// Wait for the next record. `Ok(None)` means the subscription ended.
    async fn next(&mut self) -> Result<Option<InboundRecord>, BrokerError>;

    /// Mark the pending record as handled so it is not redelivered.
    async fn commit(&mut self, record: &InboundRecord) -> Result<(), BrokerError>;

    /// Report that the pending record is still being handled, restarting the
    /// broker's redelivery timer. Brokers without such a timer ignore it.
    async fn keep_alive(&mut self, _record: &InboundRecord) -> Result<(), BrokerError> {
        Ok(())
    }

    /// Release the subscription. Consumes it, so it can only happen once.
    async fn close(self) -> Result<(), BrokerError>
    where
        Self: Sized;
}
