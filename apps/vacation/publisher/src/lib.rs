//! Vacation Publisher
//!
//! Deploys the vacation process, optionally starts an instance, then works
//! `put` jobs by publishing one record per job to the `vacation` topic.
//!
//! ## Architecture
//!
//! ```text
//! Workflow engine (put jobs)
//!   ↓ ActivateJobs, max 5 active, 10s lease
//! JobWorker<ZeebeClient, PublishJobHandler>
//!   ↓ record (messageType, job key), waits for the ack
//! NATS JetStream (VACATION stream, subject `vacation`)
//! ```
//!
//! Jobs are left open; the completer finishes them once it consumes the record.

mod config;

pub use config::PublisherConfig;

use core_config::{app_info, FromEnv};
use domain_vacation::{PublishJobHandler, VacationStream};
use eyre::{eyre, Result, WrapErr};
use messaging::nats::{HealthServer, HealthState, NatsPublisher, StreamConfig, TopicConfig};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use zeebe_client::{JobWorker, ZeebeClient};

/// Process model deployed when `BPMN_RESOURCE` is not set.
const BUNDLED_BPMN: &[u8] = include_bytes!("../resources/vacation8.bpmn");
const BUNDLED_BPMN_NAME: &str = "vacation8.bpmn";

/// Connections shared by the startup sequence and the job worker.
pub struct PublisherContext {
    pub config: PublisherConfig,
    pub zeebe: Arc<ZeebeClient>,
    pub publisher: NatsPublisher,
}

impl PublisherContext {
    /// Connect to the engine and the broker and make sure the topic exists.
    pub async fn connect(config: PublisherConfig, health: &HealthState) -> Result<Self> {
        let zeebe = ZeebeClient::connect_lazy(&config.zeebe).wrap_err("Failed to create gateway client")?;

        let topology = zeebe
            .topology()
            .await
            .wrap_err_with(|| format!("Failed to reach gateway at {}", config.zeebe.address))?;
        info!("Cluster topology:\n{topology}");
        health.set_engine_connected(true).await;

        info!(url = %config.nats.url, "Connecting to NATS...");
        let client = messaging::nats::connect(&config.nats.url, config.nats.client_name.as_deref())
            .await
            .wrap_err("Failed to connect to NATS")?;
        let publisher = NatsPublisher::new(async_nats::jetstream::new(client));
        publisher
            .ensure_stream(&topic_config(&config.topic))
            .await
            .wrap_err_with(|| format!("Failed to prepare stream for topic {}", config.topic))?;
        health.set_broker_connected(true).await;

        Ok(Self {
            config,
            zeebe: Arc::new(zeebe),
            publisher,
        })
    }

    /// Deploy the process model and return the BPMN id of its first process.
    pub async fn deploy_process(&self) -> Result<String> {
        let deployment = match &self.config.bpmn_resource {
            Some(path) => self.zeebe.deploy_resource_file(path).await,
            None => {
                self.zeebe
                    .deploy_resource(BUNDLED_BPMN_NAME.to_string(), BUNDLED_BPMN.to_vec())
                    .await
            }
        }
        .wrap_err("Failed to deploy process")?;

        let process = deployment
            .processes
            .first()
            .ok_or_else(|| eyre!("Deployment {} contains no process", deployment.key))?;

        info!(
            bpmn_process_id = %process.bpmn_process_id,
            version = process.version,
            process_definition_key = process.process_definition_key,
            "Process definition has been deployed"
        );
        Ok(process.bpmn_process_id.clone())
    }

    /// Start one instance of the latest version of a process.
    pub async fn start_instance(&self, bpmn_process_id: &str) -> Result<i64> {
        let instance = self
            .zeebe
            .create_process_instance_latest(bpmn_process_id, Some(&self.config.instance_variables))
            .await
            .wrap_err_with(|| format!("Failed to start an instance of {bpmn_process_id}"))?;

        info!(
            process_instance_key = instance.process_instance_key,
            bpmn_process_id = %instance.bpmn_process_id,
            version = instance.version,
            "Process instance has been started"
        );
        Ok(instance.process_instance_key)
    }

    /// Work `put` jobs until shutdown.
    pub async fn run_worker(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let handler = PublishJobHandler::new(self.publisher, self.config.topic.clone())
            .with_ack_timeout(self.config.publish_ack_timeout)
            .with_failure_policy(self.config.failure_policy);

        info!(
            topic = %handler.topic(),
            ack_timeout_ms = self.config.publish_ack_timeout.as_millis() as u64,
            failure_policy = ?self.config.failure_policy,
            "Job handler ready"
        );

        let worker = JobWorker::new(self.zeebe, Arc::new(handler), self.config.worker);
        worker.run(shutdown).await.wrap_err("Job worker failed")
    }
}

/// Stream settings for a topic; the default topic uses the vacation stream definition.
fn topic_config(topic: &str) -> TopicConfig {
    if topic == VacationStream::SUBJECT {
        TopicConfig::from_stream::<VacationStream>()
    } else {
        TopicConfig::new(topic)
    }
}

/// Run the publisher
///
/// 1. Sets up error reports, logging and metrics
/// 2. Loads configuration from the environment
/// 3. Connects to the engine (logging the topology) and to NATS
/// 4. Deploys the process and optionally starts an instance
/// 5. Works jobs until SIGINT/SIGTERM
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();
    let environment = core_config::Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let metrics_handle = messaging::nats::init_metrics();

    let (name, version) = app_info!();
    info!(name = %name, version = %version, environment = ?environment, "Starting vacation publisher");

    let config = PublisherConfig::from_env().wrap_err("Failed to load publisher configuration")?;
    info!(
        gateway = %config.zeebe.address,
        authenticated = config.zeebe.credentials.is_some(),
        nats = %config.nats.url,
        topic = %config.topic,
        job_type = %config.worker.job_type,
        worker = %config.worker.worker_name,
        max_jobs_active = config.worker.max_jobs_active,
        "Configuration loaded"
    );

    let health_server = HealthServer::new(config.health_port).with_metrics(metrics_handle);
    let health = health_server.state();
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            error!(error = %e, "Health server failed");
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let create_instance = config.create_instance;
    let context = PublisherContext::connect(config, &health).await?;

    let bpmn_process_id = context.deploy_process().await?;
    if create_instance {
        context.start_instance(&bpmn_process_id).await?;
    }

    let result = context.run_worker(shutdown_rx).await;
    health.set_worker_healthy(false).await;
    result?;

    info!("Vacation publisher stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating shutdown..."),
    }
}
