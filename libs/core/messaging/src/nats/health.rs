//! Health endpoints for K8s probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Health status of a bridge process.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub broker_connected: bool,
    pub engine_connected: bool,
    pub worker_healthy: bool,
}

/// Shared health state.
#[derive(Clone)]
pub struct HealthState {
    inner: Arc<RwLock<HealthStateInner>>,
}

struct HealthStateInner {
    broker_connected: bool,
    engine_connected: bool,
    worker_healthy: bool,
    last_error: Option<String>,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HealthStateInner {
                broker_connected: false,
                engine_connected: false,
                worker_healthy: true,
                last_error: None,
            })),
        }
    }

    pub async fn set_broker_connected(&self, connected: bool) {
        self.inner.write().await.broker_connected = connected;
    }

    pub async fn set_engine_connected(&self, connected: bool) {
        self.inner.write().await.engine_connected = connected;
    }

    pub async fn set_worker_healthy(&self, healthy: bool) {
        self.inner.write().await.worker_healthy = healthy;
    }

    pub async fn set_error(&self, error: Option<String>) {
        self.inner.write().await.last_error = error;
    }

    /// Liveness only looks at the worker; a broker or engine outage is not
    /// a reason to restart the process.
    pub async fn is_alive(&self) -> bool {
        self.inner.read().await.worker_healthy
    }

    /// Readiness requires both connections.
    pub async fn is_ready(&self) -> bool {
        let inner = self.inner.read().await;
        inner.broker_connected && inner.engine_connected && inner.worker_healthy
    }

    pub async fn status(&self) -> HealthStatus {
        let inner = self.inner.read().await;
        let ready = inner.broker_connected && inner.engine_connected && inner.worker_healthy;
        let status = if ready {
            "healthy".to_string()
        } else {
            format!(
                "unhealthy: {}",
                inner.last_error.as_deref().unwrap_or("not connected")
            )
        };

        HealthStatus {
            status,
            broker_connected: inner.broker_connected,
            engine_connected: inner.engine_connected,
            worker_healthy: inner.worker_healthy,
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health server for K8s probes.
pub struct HealthServer {
    port: u16,
    state: HealthState,
    metrics_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl HealthServer {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            state: HealthState::new(),
            metrics_handle: None,
        }
    }

    /// Serve the Prometheus handle on /metrics.
    pub fn with_metrics(mut self, handle: metrics_exporter_prometheus::PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn state(&self) -> HealthState {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/healthz", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/readyz", get(ready_handler))
            .with_state(self.state.clone());

        if let Some(handle) = self.metrics_handle.clone() {
            router = router.route(
                "/metrics",
                get(move || {
                    let handle = handle.clone();
                    async move { handle.render() }
                }),
            );
        }

        router
    }

    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.router();
        let addr = format!("0.0.0.0:{}", self.port);

        info!(addr = %addr, "Starting health server");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status().await;
    if state.is_alive().await {
        (StatusCode::OK, Json(status))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(status))
    }
}

async fn ready_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status().await;
    if state.is_ready().await {
        (StatusCode::OK, Json(status))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_requires_both_connections() {
        let state = HealthState::new();
        assert!(state.is_alive().await);
        assert!(!state.is_ready().await);

        state.set_broker_connected(true).await;
        assert!(!state.is_ready().await);

        state.set_engine_connected(true).await;
        assert!(state.is_ready().await);
        assert_eq!(state.status().await.status, "healthy");
    }

    #[tokio::test]
    async fn test_unhealthy_status_reports_last_error() {
        let state = HealthState::new();
        state.set_worker_healthy(false).await;
        state.set_error(Some("gateway unreachable".into())).await;

        assert!(!state.is_alive().await);
        let status = state.status().await;
        assert_eq!(status.status, "unhealthy: gateway unreachable");
        assert!(!status.worker_healthy);
    }
}
