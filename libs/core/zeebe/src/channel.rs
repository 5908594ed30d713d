//! Gateway channel construction.

use crate::error::{ZeebeError, ZeebeResult};
use core_config::zeebe::ZeebeConfig;
use std::time::Duration;
use tonic::transport::{ClientTlsConfig, Endpoint};

/// HTTP/2 channel settings for the gateway connection.
///
/// There is no channel-wide request timeout: job activation is a long poll,
/// so each command sets its own deadline.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub connect_timeout: Duration,
    pub http2_keep_alive_interval: Option<Duration>,
    pub keep_alive_timeout: Duration,
    pub keep_alive_while_idle: bool,
    pub tcp_nodelay: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            http2_keep_alive_interval: Some(Duration::from_secs(30)),
            keep_alive_timeout: Duration::from_secs(10),
            keep_alive_while_idle: true,
            tcp_nodelay: true,
        }
    }
}

impl ChannelConfig {
    fn apply_to_endpoint(&self, mut endpoint: Endpoint) -> Endpoint {
        if let Some(interval) = self.http2_keep_alive_interval {
            endpoint = endpoint.http2_keep_alive_interval(interval);
        }

        endpoint
            .keep_alive_timeout(self.keep_alive_timeout)
            .keep_alive_while_idle(self.keep_alive_while_idle)
            .connect_timeout(self.connect_timeout)
            .tcp_nodelay(self.tcp_nodelay)
    }
}

/// Turn a contact point into a URI.
///
/// Bare `host:port` addresses get `https://`, or `http://` for plaintext
/// gateways. Addresses that already carry a scheme are kept.
pub fn gateway_uri(address: &str, plaintext: bool) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.contains("://") {
        address.to_string()
    } else if plaintext {
        format!("http://{address}")
    } else {
        format!("https://{address}")
    }
}

/// Build the endpoint for a gateway, with TLS unless configured plaintext.
pub fn build_endpoint(config: &ZeebeConfig, channel: &ChannelConfig) -> ZeebeResult<Endpoint> {
    let uri = gateway_uri(&config.address, config.plaintext);

    let mut endpoint = Endpoint::from_shared(uri.clone()).map_err(|e| ZeebeError::InvalidAddress {
        address: config.address.clone(),
        details: e.to_string(),
    })?;

    if uri.starts_with("https://") {
        endpoint = endpoint.tls_config(ClientTlsConfig::new().with_webpki_roots())?;
    }

    Ok(channel.apply_to_endpoint(endpoint))
}
