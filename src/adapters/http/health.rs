//! Service info and health endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::application::SyncHub;
use crate::domain::foundation::Timestamp;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct HealthState {
    hub: Arc<SyncHub>,
    started_at: Instant,
    environment: String,
}

impl HealthState {
    pub fn new(hub: Arc<SyncHub>, environment: impl Into<String>) -> Self {
        Self {
            hub,
            started_at: Instant::now(),
            environment: environment.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: Timestamp,
    pub uptime_secs: u64,
    pub version: &'static str,
    pub environment: String,
    pub connected_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfoResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
    pub timestamp: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub records: &'static str,
    pub health: &'static str,
    pub websocket: &'static str,
}

/// GET /health - Liveness plus connected session count
pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Timestamp::now(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: VERSION,
        environment: state.environment.clone(),
        connected_sessions: state.hub.session_count().await,
    })
}

/// GET / - Service description
pub async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        message: "Savings tracker API",
        version: VERSION,
        endpoints: Endpoints {
            records: "/api/records",
            health: "/health",
            websocket: "/ws",
        },
        timestamp: Timestamp::now(),
    })
}

pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .with_state(state)
}
