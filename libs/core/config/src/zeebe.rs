use crate::{env_flag, env_optional, env_or_default, env_required, ConfigError, FromEnv};

pub const DEFAULT_AUTHORIZATION_SERVER_URL: &str = "https://login.cloud.camunda.io/oauth/token";
pub const DEFAULT_TOKEN_AUDIENCE: &str = "zeebe.camunda.io";

/// OAuth client credentials for a managed cluster
#[derive(Clone)]
pub struct ZeebeCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_server_url: String,
    pub audience: String,
}

impl std::fmt::Debug for ZeebeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZeebeCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authorization_server_url", &self.authorization_server_url)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Workflow engine gateway configuration
#[derive(Clone, Debug)]
pub struct ZeebeConfig {
    /// Cluster contact point, `host:port` or a full URL
    pub address: String,
    pub credentials: Option<ZeebeCredentials>,
    /// Talk to the gateway without TLS (local gateways)
    pub plaintext: bool,
}

impl ZeebeConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credentials: None,
            plaintext: false,
        }
    }

    pub fn with_credentials(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.credentials = Some(ZeebeCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_server_url: DEFAULT_AUTHORIZATION_SERVER_URL.to_string(),
            audience: DEFAULT_TOKEN_AUDIENCE.to_string(),
        });
        self
    }

    pub fn with_plaintext(mut self, plaintext: bool) -> Self {
        self.plaintext = plaintext;
        self
    }
}

impl FromEnv for ZeebeConfig {
    /// Reads:
    /// - ZEEBE_ADDRESS (required)
    /// - ZEEBE_CLIENT_ID / ZEEBE_CLIENT_SECRET (both or neither)
    /// - ZEEBE_AUTHORIZATION_SERVER_URL, ZEEBE_TOKEN_AUDIENCE
    /// - ZEEBE_PLAINTEXT (default false)
    fn from_env() -> Result<Self, ConfigError> {
        let address = env_required("ZEEBE_ADDRESS")?;

        let credentials = match (env_optional("ZEEBE_CLIENT_ID"), env_optional("ZEEBE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(ZeebeCredentials {
                client_id,
                client_secret,
                authorization_server_url: env_or_default(
                    "ZEEBE_AUTHORIZATION_SERVER_URL",
                    DEFAULT_AUTHORIZATION_SERVER_URL,
                ),
                audience: env_or_default("ZEEBE_TOKEN_AUDIENCE", DEFAULT_TOKEN_AUDIENCE),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("ZEEBE_CLIENT_SECRET".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("ZEEBE_CLIENT_ID".to_string())),
        };

        Ok(Self {
            address,
            credentials,
            plaintext: env_flag("ZEEBE_PLAINTEXT", false)?,
        })
    }
}
