//! HTTP adapters - REST API implementations.
//!
//! - `records` - CRUD, statistics and date-range queries
//! - `health` - Service info and health
//! - `middleware` - Mutation throttle
//!
//! [`app_router`] assembles these with the WebSocket endpoint.

pub mod health;
pub mod middleware;
pub mod records;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderValue, middleware::from_fn_with_state, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::websocket_router;
use crate::application::{RecordCommands, SyncHub};
use crate::ports::RateLimiter;

pub use health::{health_routes, HealthState};
pub use records::{record_routes, RecordHandlers};

/// Services the HTTP surface is built from.
#[derive(Clone)]
pub struct AppServices {
    pub hub: Arc<SyncHub>,
    pub commands: Arc<RecordCommands>,
    pub limiter: Arc<dyn RateLimiter>,
}

/// Cross-cutting HTTP settings.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub environment: String,
    pub request_timeout: Duration,
    /// Allowed CORS origins; empty means any origin.
    pub cors_origins: Vec<String>,
    /// Key clients by `X-Forwarded-For`/`X-Real-IP` instead of the socket.
    pub trust_forwarded_headers: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
            trust_forwarded_headers: false,
        }
    }
}

/// Builds the full application router.
pub fn app_router(services: AppServices, options: &HttpOptions) -> Router {
    let record_handlers = RecordHandlers::new(services.commands.clone(), services.hub.aggregator());
    let health_state = HealthState::new(services.hub.clone(), options.environment.clone());
    let throttle_state = middleware::RateLimiterState::new(services.limiter.clone())
        .trusting_forwarded_headers(options.trust_forwarded_headers);

    Router::new()
        .merge(health_routes(health_state))
        .nest("/api/records", record_routes(record_handlers))
        .merge(websocket_router(
            services.hub.clone(),
            options.trust_forwarded_headers,
        ))
        .layer(from_fn_with_state(
            throttle_state,
            middleware::throttle_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&options.cors_origins))
                .layer(TimeoutLayer::new(options.request_timeout)),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::permissive().allow_origin(AllowOrigin::list(parsed))
    }
}
