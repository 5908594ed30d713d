//! Error types for broker operations.

use std::fmt;
use thiserror::Error;

/// Error categories determine retry behavior.
///
/// - **Transient**: temporary failure, retry with exponential backoff
/// - **Permanent**: unrecoverable, do not retry
/// - **RateLimited**: upstream pushed back, retry with longer delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transient,
    Permanent,
    RateLimited,
}

impl ErrorCategory {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorCategory::Permanent)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Transient => write!(f, "transient"),
            ErrorCategory::Permanent => write!(f, "permanent"),
            ErrorCategory::RateLimited => write!(f, "rate_limited"),
        }
    }
}

/// Error that can occur while talking to the broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Connection could not be established
    #[error("broker connection error: {0}")]
    Connection(String),

    /// Stream or consumer management failed
    #[error("stream error: {0}")]
    Stream(String),

    /// Receiving or acknowledging records failed
    #[error("consumer error: {0}")]
    Consumer(String),

    /// A record was committed that is not the one currently held
    #[error("record {sequence} is not pending on this subscription")]
    NotPending { sequence: u64 },

    /// Operation did not finish in time
    #[error("timeout: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl BrokerError {
    /// Get the error category for retry decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            BrokerError::Connection(_) => ErrorCategory::Transient,
            BrokerError::Timeout(_) => ErrorCategory::Transient,
            BrokerError::Consumer(_) => ErrorCategory::Transient,
            BrokerError::Stream(msg) if msg.contains("timed out") => ErrorCategory::Transient,
            BrokerError::Stream(_) => ErrorCategory::Permanent,
            BrokerError::NotPending { .. } => ErrorCategory::Permanent,
            BrokerError::Config(_) => ErrorCategory::Permanent,
        }
    }

    pub fn stream(error: impl fmt::Display) -> Self {
        Self::Stream(error.to_string())
    }

    pub fn consumer(error: impl fmt::Display) -> Self {
        Self::Consumer(error.to_string())
    }
}
