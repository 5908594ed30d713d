use crate::{env_or_default, ConfigError, FromEnv};

pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// Message broker connection configuration
#[derive(Clone, Debug)]
pub struct NatsConfig {
    pub url: String,
    /// Client name reported to the server
    pub client_name: Option<String>,
}

impl NatsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_name: None,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NATS_URL)
    }
}

impl FromEnv for NatsConfig {
    /// Reads NATS_URL (default `nats://localhost:4222`)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(env_or_default("NATS_URL", DEFAULT_NATS_URL)))
    }
}
