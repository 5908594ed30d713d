//! Record and delivery report types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A keyed record to be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRecord {
    pub key: String,
    pub value: String,
}

impl OutboundRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A record pulled from a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundRecord {
    pub topic: String,
    pub key: Option<String>,
    pub value: String,
    /// Position of the record in its stream
    pub sequence: u64,
    /// Number of times the broker has delivered this record
    pub delivery_count: u64,
}

impl InboundRecord {
    pub fn is_redelivery(&self) -> bool {
        self.delivery_count > 1
    }
}

/// Why a publish was not confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    /// The broker refused or failed to persist the record
    #[error("broker rejected the record: {0}")]
    Rejected(String),

    /// No acknowledgment arrived within the allotted time
    #[error("no acknowledgment within {0:?}")]
    TimedOut(Duration),

    /// The connection went away before an acknowledgment arrived
    #[error("connection lost before acknowledgment: {0}")]
    Disconnected(String),
}

/// Outcome of a single publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered { sequence: u64, duplicate: bool },
    Failed(DeliveryFailure),
}

/// The broker's answer to one publish. Every publish yields exactly one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub topic: String,
    pub record: OutboundRecord,
    pub status: DeliveryStatus,
}

impl DeliveryReport {
    pub fn delivered(topic: impl Into<String>, record: OutboundRecord, sequence: u64) -> Self {
        Self {
            topic: topic.into(),
            record,
            status: DeliveryStatus::Delivered {
                sequence,
                duplicate: false,
            },
        }
    }

    pub fn failed(topic: impl Into<String>, record: OutboundRecord, failure: DeliveryFailure) -> Self {
        Self {
            topic: topic.into(),
            record,
            status: DeliveryStatus::Failed(failure),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.status, DeliveryStatus::Delivered { .. })
    }

    pub fn failure(&self) -> Option<&DeliveryFailure> {
        match &self.status {
            DeliveryStatus::Failed(failure) => Some(failure),
            DeliveryStatus::Delivered { .. } => None,
        }
    }
}

impl fmt::Display for DeliveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            DeliveryStatus::Delivered { sequence, .. } => write!(
                f,
                "delivered to {}@{}: key = {} value = {}",
                self.topic, sequence, self.record.key, self.record.value
            ),
            DeliveryStatus::Failed(failure) => write!(
                f,
                "failed to deliver to {}: key = {} value = {}: {}",
                self.topic, self.record.key, self.record.value, failure
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivered_report() {
        let report = DeliveryReport::delivered("vacation", OutboundRecord::new("alert", "42"), 7);
        assert!(report.is_delivered());
        assert!(report.failure().is_none());
        assert_eq!(report.to_string(), "delivered to vacation@7: key = alert value = 42");
    }

    #[test]
    fn test_failed_report() {
        let report = DeliveryReport::failed(
            "vacation",
            OutboundRecord::new("alert", "42"),
            DeliveryFailure::TimedOut(Duration::from_secs(10)),
        );
        assert!(!report.is_delivered());
        assert_eq!(
            report.failure(),
            Some(&DeliveryFailure::TimedOut(Duration::from_secs(10)))
        );
        assert!(report.to_string().contains("no acknowledgment within 10s"));
    }

    #[test]
    fn test_redelivery_flag() {
        let mut record = InboundRecord {
            topic: "vacation".into(),
            key: Some("alert".into()),
            value: "42".into(),
            sequence: 1,
            delivery_count: 1,
        };
        assert!(!record.is_redelivery());
        record.delivery_count = 2;
        assert!(record.is_redelivery());
    }
}
