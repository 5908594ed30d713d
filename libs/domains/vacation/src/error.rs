//! Error types for the vacation bridge.

use crate::correlation::CorrelationKeyError;
use messaging::{BrokerError, DeliveryFailure};
use thiserror::Error;
use zeebe_client::ZeebeError;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Job variables are missing or not shaped as `{ key, value }`
    #[error("invalid job variables: {0}")]
    Variables(#[source] serde_json::Error),

    /// Custom headers do not carry a `messageType`
    #[error("invalid job headers: {0}")]
    Headers(#[source] serde_json::Error),

    #[error(transparent)]
    Correlation(#[from] CorrelationKeyError),

    /// The broker did not confirm a publish
    #[error("publish failed: {0}")]
    Delivery(#[from] DeliveryFailure),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Engine(#[from] ZeebeError),
}
