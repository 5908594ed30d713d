//! Error types for gateway operations.

use messaging::ErrorCategory;
use std::path::PathBuf;
use thiserror::Error;
use tonic::Code;

pub type ZeebeResult<T> = Result<T, ZeebeError>;

/// Error that can occur while talking to the workflow engine gateway.
#[derive(Debug, Error)]
pub enum ZeebeError {
    /// The configured contact point is not a usable URI
    #[error("invalid gateway address '{address}': {details}")]
    InvalidAddress { address: String, details: String },

    /// Channel setup failed
    #[error("gateway transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The gateway answered a command with a non-OK status
    #[error("{command} rejected: {status}")]
    Rpc {
        command: &'static str,
        #[source]
        status: tonic::Status,
    },

    /// Access token could not be obtained
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A process resource could not be read
    #[error("failed to read resource {}: {source}", .path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Variables could not be encoded
    #[error("invalid variables: {0}")]
    Variables(#[from] serde_json::Error),

    /// The command did not finish in time
    #[error("{command} timed out")]
    Timeout { command: &'static str },
}

impl ZeebeError {
    pub fn rpc(command: &'static str, status: tonic::Status) -> Self {
        Self::Rpc { command, status }
    }

    /// gRPC status code, when the gateway answered.
    pub fn code(&self) -> Option<Code> {
        match self {
            ZeebeError::Rpc { status, .. } => Some(status.code()),
            _ => None,
        }
    }

    /// The job a command referred to no longer accepts it: already completed,
    /// failed, timed out or never existed.
    pub fn is_stale(&self) -> bool {
        matches!(
            self.code(),
            Some(Code::NotFound | Code::FailedPrecondition | Code::InvalidArgument)
        )
    }

    /// Get the error category for retry decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ZeebeError::Rpc { status, .. } => match status.code() {
                Code::ResourceExhausted => ErrorCategory::RateLimited,
                Code::Unavailable
                | Code::DeadlineExceeded
                | Code::Aborted
                | Code::Internal
                | Code::Unknown
                | Code::Cancelled => ErrorCategory::Transient,
                _ => ErrorCategory::Permanent,
            },
            ZeebeError::Transport(_) | ZeebeError::Timeout { .. } => ErrorCategory::Transient,
            ZeebeError::Auth(_) => ErrorCategory::Transient,
            ZeebeError::InvalidAddress { .. }
            | ZeebeError::Resource { .. }
            | ZeebeError::Variables(_) => ErrorCategory::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::RateLimited
        )
    }
}
