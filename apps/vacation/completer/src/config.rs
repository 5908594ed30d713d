use core_config::nats::NatsConfig;
use core_config::zeebe::ZeebeConfig;
use core_config::{env_millis, env_or_default, env_parse, ConfigError, Environment, FromEnv};
use domain_vacation::{CompletionPolicy, VacationStream};
use messaging::nats::StreamConfig;
use messaging::RetryPolicy;
use std::time::Duration;

/// Completer configuration, loaded once at startup
#[derive(Clone, Debug)]
pub struct CompleterConfig {
    pub environment: Environment,
    pub zeebe: ZeebeConfig,
    pub nats: NatsConfig,
    pub topic: String,
    /// Durable consumer name; restarts resume from its last commit
    pub consumer_name: String,
    /// Time the broker waits for a commit before redelivering
    pub ack_wait: Duration,
    pub completion: CompletionPolicy,
    pub health_port: u16,
}

/// Shortest ack wait accepted; in-progress reports go out at a third of it.
const MIN_ACK_WAIT: Duration = Duration::from_secs(3);

impl CompleterConfig {
    /// Interval at which a record still being completed is reported in
    /// progress, resetting its ack wait.
    pub fn keep_alive_interval(&self) -> Duration {
        self.ack_wait / 3
    }
}

impl FromEnv for CompleterConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let consumer_name = env_or_default("CONSUMER_NAME", VacationStream::CONSUMER_NAME);

        let completion = CompletionPolicy::default()
            .with_request_timeout(env_millis("COMPLETE_TIMEOUT_MS", Duration::from_secs(30))?)
            .with_retry(
                RetryPolicy::default()
                    .with_max_transient_retries(env_parse("COMPLETE_MAX_RETRIES", 3u32)?),
            );

        let ack_wait = env_millis(
            "ACK_WAIT_MS",
            Duration::from_secs(VacationStream::ACK_WAIT_SECS),
        )?;
        if ack_wait < MIN_ACK_WAIT {
            return Err(ConfigError::Invalid(format!(
                "ACK_WAIT_MS must be at least {}",
                MIN_ACK_WAIT.as_millis()
            )));
        }

        Ok(Self {
            environment: Environment::from_env(),
            zeebe: ZeebeConfig::from_env()?,
            nats: NatsConfig::from_env()?.with_client_name(consumer_name.clone()),
            topic: env_or_default("BRIDGE_TOPIC", VacationStream::SUBJECT),
            consumer_name,
            ack_wait,
            completion,
            health_port: env_parse("HEALTH_PORT", 8082u16)?,
        })
    }
}
