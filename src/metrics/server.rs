//! HTTP exporter for live capture metrics.
//!
//! Serves `/metrics` (Prometheus text), `/stats` (the latest
//! [`CaptureStats`] as JSON) and `/health` (the current stream state).
//! The controller side pushes a fresh snapshot into the shared
//! [`MetricsState`] after every operation.

use super::{CaptureStats, MetricsRegistry};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Errors raised by the exporter.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind metrics listener: {0}")]
    Bind(#[from] std::io::Error),

    #[error("metrics server stopped: {0}")]
    Server(String),
}

/// Where the exporter listens.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Listens on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Registry plus the snapshot it was last updated from.
pub struct MetricsState {
    registry: MetricsRegistry,
    latest: CaptureStats,
}

/// Handle shared between the controller loop and the HTTP handlers.
pub type SharedMetrics = Arc<RwLock<MetricsState>>;

impl MetricsState {
    /// Wraps `registry` with an empty snapshot.
    pub fn new(registry: MetricsRegistry) -> Self {
        Self {
            registry,
            latest: CaptureStats::default(),
        }
    }

    /// Records a new controller snapshot.
    pub fn update(&mut self, stats: CaptureStats) {
        self.registry.update(&stats);
        self.latest = stats;
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> &CaptureStats {
        &self.latest
    }
}

/// Builds the exporter routes over `state`.
pub fn router(state: SharedMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Prometheus exporter bound to a [`SharedMetrics`] handle.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedMetrics,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState::new(registry))),
        }
    }

    /// Returns the handle the controller loop updates.
    pub fn state(&self) -> SharedMetrics {
        Arc::clone(&self.state)
    }

    /// Serves until the process exits.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves, then drains open connections.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics exporter listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

async fn metrics_handler(State(state): State<SharedMetrics>) -> Response {
    match state.read().await.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

async fn stats_handler(State(state): State<SharedMetrics>) -> Json<CaptureStats> {
    Json(state.read().await.latest.clone())
}

async fn health_handler(State(state): State<SharedMetrics>) -> String {
    state.read().await.latest.stream_state.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StreamState;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn shared() -> SharedMetrics {
        Arc::new(RwLock::new(MetricsState::new(MetricsRegistry::new().unwrap())))
    }

    async fn get(state: &SharedMetrics, uri: &str) -> (StatusCode, String) {
        let response = router(Arc::clone(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_config_with_port() {
        assert_eq!(MetricsServerConfig::default().bind_addr.port(), 9090);
        assert_eq!(MetricsServerConfig::with_port(8080).bind_addr.port(), 8080);
    }

    #[tokio::test]
    async fn test_metrics_follow_live_updates() {
        let state = shared();

        let (status, body) = get(&state, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("camera_capture_frames_grabbed_total 0"));

        state.write().await.update(CaptureStats {
            stream_state: StreamState::Ready,
            frames_grabbed: 3,
            ..Default::default()
        });

        let (_, body) = get(&state, "/metrics").await;
        assert!(body.contains("camera_capture_frames_grabbed_total 3"));
        assert!(body.contains("camera_capture_stream_ready 1"));
    }

    #[tokio::test]
    async fn test_stats_and_health_report_latest_snapshot() {
        let state = shared();
        assert_eq!(get(&state, "/health").await, (StatusCode::OK, "idle".to_string()));

        state.write().await.update(CaptureStats {
            stream_state: StreamState::Ready,
            uploads: 2,
            frame_width: 1280,
            frame_height: 720,
            ..Default::default()
        });

        assert_eq!(get(&state, "/health").await.1, "ready");

        let (status, body) = get(&state, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        let stats: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(stats["stream_state"], "ready");
        assert_eq!(stats["uploads"], 2);
        assert_eq!(stats["frame_width"], 1280);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = get(&shared(), "/frames").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
