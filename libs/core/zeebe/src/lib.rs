//! Workflow engine gateway client and job worker.
//!
//! - [`ZeebeClient`]: gRPC client for the gateway (topology, deployments,
//!   process instances, job commands), with optional OAuth credentials.
//! - [`JobClient`]: the job commands as a trait, so workers and completers
//!   can be tested without a gateway.
//! - [`JobWorker`]: polls for jobs of one type and runs a [`JobHandler`]
//!   for each with bounded concurrency.
//!
//! ```rust,ignore
//! let client = Arc::new(ZeebeClient::connect_lazy(&ZeebeConfig::from_env()?)?);
//! let worker = JobWorker::new(client, Arc::new(handler), JobWorkerConfig::new("put"));
//! worker.run(shutdown_rx).await?;
//! ```

pub mod auth;
pub mod channel;
pub mod client;
pub mod error;
pub mod generated;
pub mod job;
pub mod metrics;
pub mod worker;

pub use channel::ChannelConfig;
pub use client::{ActivateJobs, JobClient, ZeebeClient};
pub use error::{ZeebeError, ZeebeResult};
pub use job::{ActivatedJob, Deployment, DeployedProcess, ProcessInstance, Topology};
pub use worker::{JobError, JobHandler, JobWorker, JobWorkerConfig};
