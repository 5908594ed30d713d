//! Vacation bridge domain
//!
//! Connects `put` jobs of the vacation process to the `vacation` topic and
//! back again.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Workflow engine │  ← activates `put` jobs
//! └────────┬────────┘
//!          │
//! ┌────────▼─────────┐
//! │ PublishJobHandler│  ← record (messageType, job key), waits for the ack
//! └────────┬─────────┘
//!          │
//! ┌────────▼────────┐
//! │ vacation topic  │  ← NATS JetStream
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ CompletionLoop  │  ← parses the job key, completes the job
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Workflow engine │  ← job completed, process continues
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_vacation::{CompletionLoop, CompletionPolicy, JobCompleter};
//!
//! let completer = JobCompleter::new(client, CompletionPolicy::default());
//! let summary = CompletionLoop::new(completer).run(subscription, shutdown_rx).await?;
//! ```

pub mod completion;
pub mod confirmation;
pub mod consumer;
pub mod correlation;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod models;
pub mod streams;

pub use completion::{CompletionOutcome, CompletionPolicy, JobCompleter};
pub use confirmation::{publish_confirmed, DEFAULT_ACK_TIMEOUT};
pub use consumer::{CompletionLoop, LoopSummary};
pub use correlation::{CorrelationKey, CorrelationKeyError};
pub use error::{BridgeError, BridgeResult};
pub use handler::{PublishFailurePolicy, PublishJobHandler};
pub use models::{JobHeaders, JobVariables, OutboundMessage};
pub use streams::{VacationStream, JOB_TYPE};
