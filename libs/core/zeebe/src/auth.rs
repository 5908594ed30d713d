//! OAuth client-credentials tokens for managed clusters.

use crate::error::{ZeebeError, ZeebeResult};
use core_config::zeebe::ZeebeCredentials;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tonic::metadata::{Ascii, MetadataValue};
use tracing::debug;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    header: MetadataValue<Ascii>,
    refresh_at: Instant,
}

/// Fetches and caches bearer tokens for the gateway.
pub struct TokenProvider {
    http: reqwest::Client,
    credentials: ZeebeCredentials,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(credentials: ZeebeCredentials) -> ZeebeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ZeebeError::Auth(e.to_string()))?;

        Ok(Self {
            http,
            credentials,
            cached: Mutex::new(None),
        })
    }

    /// `Bearer <token>` metadata value, fetching a new token when needed.
    pub async fn authorization(&self) -> ZeebeResult<MetadataValue<Ascii>> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.header.clone());
            }
        }

        let token = self.fetch().await?;
        let header = token_header(&token.access_token)?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(300));

        *cached = Some(CachedToken {
            header: header.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        });

        Ok(header)
    }

    async fn fetch(&self) -> ZeebeResult<TokenResponse> {
        debug!(
            url = %self.credentials.authorization_server_url,
            audience = %self.credentials.audience,
            "Requesting access token"
        );

        let response = self
            .http
            .post(&self.credentials.authorization_server_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("audience", self.credentials.audience.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ZeebeError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZeebeError::Auth(format!(
                "authorization server returned {status}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ZeebeError::Auth(format!("invalid token response: {e}")))
    }
}

fn token_header(access_token: &str) -> ZeebeResult<MetadataValue<Ascii>> {
    format!("Bearer {access_token}")
        .parse()
        .map_err(|_| ZeebeError::Auth("access token is not valid header text".to_string()))
}
