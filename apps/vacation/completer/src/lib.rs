//! Vacation Completer
//!
//! Consumes the `vacation` topic and completes the job each record names.
//!
//! ## Architecture
//!
//! ```text
//! NATS JetStream (VACATION stream, durable consumer `vacation-completer`)
//!   ↓ one record at a time, explicit acks
//! CompletionLoop
//!   ↓ CompleteJob(job key), stale/transient classification
//! Workflow engine
//! ```

mod config;

pub use config::CompleterConfig;

use core_config::{app_info, FromEnv};
use domain_vacation::{CompletionLoop, JobCompleter, LoopSummary, VacationStream};
use eyre::{Result, WrapErr};
use messaging::nats::{HealthServer, HealthState, NatsSubscription, StreamConfig, SubscriptionConfig, TopicConfig};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use zeebe_client::ZeebeClient;

/// Connections owned by the completer.
pub struct CompleterContext {
    pub config: CompleterConfig,
    pub zeebe: Arc<ZeebeClient>,
    pub subscription: NatsSubscription,
}

impl CompleterContext {
    /// Connect to the engine, log its topology and subscribe to the topic.
    pub async fn connect(config: CompleterConfig, health: &HealthState) -> Result<Self> {
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
        let jetstream = async_nats::jetstream::new(client);

        let subscription = NatsSubscription::subscribe(&jetstream, subscription_config(&config))
            .await
            .wrap_err_with(|| format!("Failed to subscribe to topic {}", config.topic))?;
        health.set_broker_connected(true).await;

        Ok(Self {
            config,
            zeebe: Arc::new(zeebe),
            subscription,
        })
    }

    /// Complete jobs until shutdown. The subscription is closed on return.
    pub async fn run_loop(self, shutdown: watch::Receiver<bool>) -> Result<LoopSummary> {
        let completer = JobCompleter::new(self.zeebe, self.config.completion.clone());
        CompletionLoop::new(completer)
            .with_keep_alive_interval(self.config.keep_alive_interval())
            .run(self.subscription, shutdown)
            .await
            .wrap_err("Completion loop failed")
    }
}

fn subscription_config(config: &CompleterConfig) -> SubscriptionConfig {
    let topic = if config.topic == VacationStream::SUBJECT {
        TopicConfig::from_stream::<VacationStream>()
    } else {
        TopicConfig::new(&config.topic)
    };

    SubscriptionConfig::new(topic, &config.consumer_name).with_ack_wait(config.ack_wait)
}

/// Run the completer
///
/// 1. Sets up error reports, logging and metrics
/// 2. Loads configuration from the environment
/// 3. Connects to the engine (logging the topology) and subscribes to NATS
/// 4. Completes jobs until SIGINT/SIGTERM, then closes the subscription
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();
    let environment = core_config::Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let metrics_handle = messaging::nats::init_metrics();

    let (name, version) = app_info!();
    info!(name = %name, version = %version, environment = ?environment, "Starting vacation completer");

    let config = CompleterConfig::from_env().wrap_err("Failed to load completer configuration")?;
    info!(
        gateway = %config.zeebe.address,
        authenticated = config.zeebe.credentials.is_some(),
        nats = %config.nats.url,
        topic = %config.topic,
        consumer = %config.consumer_name,
        complete_timeout_ms = config.completion.request_timeout.as_millis() as u64,
        max_retries = config.completion.retry.max_transient_retries,
        ack_wait_ms = config.ack_wait.as_millis() as u64,
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

    let context = CompleterContext::connect(config, &health).await?;
    let result = context.run_loop(shutdown_rx).await;
    health.set_worker_healthy(false).await;
    let summary = result?;

    info!(
        consumed = summary.consumed,
        completed = summary.completed,
        "Vacation completer stopped"
    );
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
