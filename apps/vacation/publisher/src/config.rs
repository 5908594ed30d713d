use core_config::nats::NatsConfig;
use core_config::zeebe::ZeebeConfig;
use core_config::{
    env_flag, env_millis, env_optional, env_or_default, env_parse, ConfigError, Environment, FromEnv,
};
use domain_vacation::{PublishFailurePolicy, VacationStream, DEFAULT_ACK_TIMEOUT, JOB_TYPE};
use messaging::nats::StreamConfig;
use std::path::PathBuf;
use std::time::Duration;
use zeebe_client::JobWorkerConfig;

/// Variables for the created instance when `INSTANCE_VARIABLES` is unset.
const DEFAULT_INSTANCE_VARIABLES: &str = r#"{"key":"vacation-request","value":"pending"}"#;

/// Publisher configuration, loaded once at startup
#[derive(Clone, Debug)]
pub struct PublisherConfig {
    pub environment: Environment,
    pub zeebe: ZeebeConfig,
    pub nats: NatsConfig,
    pub topic: String,
    /// Process model to deploy instead of the bundled one
    pub bpmn_resource: Option<PathBuf>,
    pub create_instance: bool,
    pub instance_variables: serde_json::Value,
    pub worker: JobWorkerConfig,
    pub publish_ack_timeout: Duration,
    pub failure_policy: PublishFailurePolicy,
    pub health_port: u16,
}

impl FromEnv for PublisherConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut worker = JobWorkerConfig::new(JOB_TYPE)
            .with_max_jobs_active(env_parse("MAX_JOBS_ACTIVE", 5usize)?)
            .with_poll_interval(env_millis("POLL_INTERVAL_MS", Duration::from_secs(1))?)
            .with_timeout(env_millis("JOB_TIMEOUT_MS", Duration::from_secs(10))?);
        if let Some(name) = env_optional("WORKER_NAME").or_else(|| env_optional("HOSTNAME")) {
            worker = worker.with_worker_name(name);
        }

        let raw_variables = env_or_default("INSTANCE_VARIABLES", DEFAULT_INSTANCE_VARIABLES);
        let instance_variables: serde_json::Value =
            serde_json::from_str(&raw_variables).map_err(|e| ConfigError::ParseError {
                key: "INSTANCE_VARIABLES".to_string(),
                details: e.to_string(),
            })?;
        if !instance_variables.is_object() {
            return Err(ConfigError::Invalid(
                "INSTANCE_VARIABLES must be a JSON object".to_string(),
            ));
        }

        // A failed publish fails the job, which needs the lease to still be held.
        let publish_ack_timeout = env_millis("PUBLISH_ACK_TIMEOUT_MS", DEFAULT_ACK_TIMEOUT)?;
        if publish_ack_timeout >= worker.timeout {
            return Err(ConfigError::Invalid(format!(
                "PUBLISH_ACK_TIMEOUT_MS ({}) must be shorter than JOB_TIMEOUT_MS ({})",
                publish_ack_timeout.as_millis(),
                worker.timeout.as_millis()
            )));
        }

        let failure_policy = if env_flag("FAIL_JOB_ON_PUBLISH_ERROR", true)? {
            PublishFailurePolicy::FailJob
        } else {
            PublishFailurePolicy::LogOnly
        };

        Ok(Self {
            environment: Environment::from_env(),
            zeebe: ZeebeConfig::from_env()?,
            nats: NatsConfig::from_env()?.with_client_name(worker.worker_name.clone()),
            topic: env_or_default("BRIDGE_TOPIC", VacationStream::SUBJECT),
            bpmn_resource: env_optional("BPMN_RESOURCE").map(PathBuf::from),
            create_instance: env_flag("CREATE_INSTANCE", true)?,
            instance_variables,
            worker,
            publish_ack_timeout,
            failure_policy,
            health_port: env_parse("HEALTH_PORT", 8081u16)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "ZEEBE_ADDRESS",
        "ZEEBE_CLIENT_ID",
        "ZEEBE_CLIENT_SECRET",
        "NATS_URL",
        "BRIDGE_TOPIC",
        "BPMN_RESOURCE",
        "CREATE_INSTANCE",
        "INSTANCE_VARIABLES",
        "MAX_JOBS_ACTIVE",
        "POLL_INTERVAL_MS",
        "JOB_TIMEOUT_MS",
        "WORKER_NAME",
        "HOSTNAME",
        "PUBLISH_ACK_TIMEOUT_MS",
        "FAIL_JOB_ON_PUBLISH_ERROR",
        "HEALTH_PORT",
    ];

    fn with_env<F: FnOnce()>(set: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = VARS
            .iter()
            .map(|key| (*key, set.iter().find(|(k, _)| k == key).map(|(_, v)| *v)))
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_defaults() {
        with_env(&[("ZEEBE_ADDRESS", "localhost:26500")], || {
            let config = PublisherConfig::from_env().unwrap();
            assert_eq!(config.topic, "vacation");
            assert!(config.create_instance);
            assert_eq!(config.instance_variables["key"], "vacation-request");
            assert_eq!(config.worker.job_type, "put");
            assert_eq!(config.worker.max_jobs_active, 5);
            assert_eq!(config.worker.poll_interval, Duration::from_secs(1));
            assert_eq!(config.worker.timeout, Duration::from_secs(10));
            assert_eq!(config.publish_ack_timeout, Duration::from_secs(5));
            assert!(config.publish_ack_timeout < config.worker.timeout);
            assert_eq!(config.failure_policy, PublishFailurePolicy::FailJob);
            assert_eq!(config.health_port, 8081);
            assert!(config.bpmn_resource.is_none());
        });
    }

    #[test]
    fn test_worker_name_falls_back_to_hostname() {
        with_env(&[("ZEEBE_ADDRESS", "localhost:26500"), ("HOSTNAME", "node-7")], || {
            let config = PublisherConfig::from_env().unwrap();
            assert_eq!(config.worker.worker_name, "node-7");
            assert_eq!(config.nats.client_name.as_deref(), Some("node-7"));
        });

        with_env(
            &[
                ("ZEEBE_ADDRESS", "localhost:26500"),
                ("HOSTNAME", "node-7"),
                ("WORKER_NAME", "publisher-1"),
            ],
            || {
                let config = PublisherConfig::from_env().unwrap();
                assert_eq!(config.worker.worker_name, "publisher-1");
            },
        );
    }

    #[test]
    fn test_overrides() {
        with_env(
            &[
                ("ZEEBE_ADDRESS", "localhost:26500"),
                ("BRIDGE_TOPIC", "leave"),
                ("CREATE_INSTANCE", "false"),
                ("INSTANCE_VARIABLES", r#"{"key":"k1","value":"v1"}"#),
                ("MAX_JOBS_ACTIVE", "2"),
                ("FAIL_JOB_ON_PUBLISH_ERROR", "false"),
            ],
            || {
                let config = PublisherConfig::from_env().unwrap();
                assert_eq!(config.topic, "leave");
                assert!(!config.create_instance);
                assert_eq!(config.instance_variables["value"], "v1");
                assert_eq!(config.worker.max_jobs_active, 2);
                assert_eq!(config.failure_policy, PublishFailurePolicy::LogOnly);
            },
        );
    }

    #[test]
    fn test_missing_address_is_an_error() {
        with_env(&[], || {
            let err = PublisherConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("ZEEBE_ADDRESS"));
        });
    }

    #[test]
    fn test_client_id_without_secret_is_an_error() {
        with_env(
            &[("ZEEBE_ADDRESS", "cluster:443"), ("ZEEBE_CLIENT_ID", "id")],
            || {
                let err = PublisherConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("ZEEBE_CLIENT_SECRET"));
            },
        );
    }

    #[test]
    fn test_ack_timeout_must_be_shorter_than_lease() {
        with_env(
            &[
                ("ZEEBE_ADDRESS", "localhost:26500"),
                ("PUBLISH_ACK_TIMEOUT_MS", "10000"),
                ("JOB_TIMEOUT_MS", "10000"),
            ],
            || {
                let err = PublisherConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::Invalid(_)));
                assert!(err.to_string().contains("PUBLISH_ACK_TIMEOUT_MS"));
            },
        );

        with_env(
            &[
                ("ZEEBE_ADDRESS", "localhost:26500"),
                ("PUBLISH_ACK_TIMEOUT_MS", "10000"),
                ("JOB_TIMEOUT_MS", "30000"),
            ],
            || {
                let config = PublisherConfig::from_env().unwrap();
                assert_eq!(config.publish_ack_timeout, Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn test_instance_variables_must_be_an_object() {
        with_env(
            &[("ZEEBE_ADDRESS", "localhost:26500"), ("INSTANCE_VARIABLES", "[1,2]")],
            || {
                assert!(matches!(
                    PublisherConfig::from_env(),
                    Err(ConfigError::Invalid(_))
                ));
            },
        );
        with_env(
            &[("ZEEBE_ADDRESS", "localhost:26500"), ("INSTANCE_VARIABLES", "{")],
            || {
                assert!(matches!(
                    PublisherConfig::from_env(),
                    Err(ConfigError::ParseError { .. })
                ));
            },
        );
    }
}
