//! Mutation throttle middleware for axum.
//!
//! Every request is counted against the *general* tier. Record mutations
//! are additionally counted against *write* (create, update, delete) or
//! *clear* (bulk delete). Tiers are checked in that order, so a request
//! rejected by its write tier has already consumed general quota.
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the window resets
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! Clients are keyed by socket address. `X-Forwarded-For` and `X-Real-IP`
//! are only honoured when the server is configured to trust them, i.e. it
//! sits behind a proxy that overwrites those headers.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get, middleware};
//! use std::sync::Arc;
//!
//! let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::with_defaults());
//! let state = RateLimiterState::new(limiter);
//!
//! let app = Router::new()
//!     .route("/api/records", get(handler))
//!     .layer(middleware::from_fn_with_state(state, throttle_middleware));
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::ports::{
    RateLimitDenied, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter, ThrottleTier,
};

/// Rate limiter middleware state.
#[derive(Clone)]
pub struct RateLimiterState {
    limiter: Arc<dyn RateLimiter>,
    trust_forwarded_headers: bool,
}

impl RateLimiterState {
    /// Keys clients by socket address only.
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            limiter,
            trust_forwarded_headers: false,
        }
    }

    /// Also key clients by forwarded headers when `trust` is set.
    pub fn trusting_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }
}

/// Identity used when no forwarded header or socket address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

const RECORDS_PREFIX: &str = "/api/records";
const CLEAR_PATH: &str = "/api/records/clear";

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    /// Maximum requests allowed in the window.
    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    /// Requests remaining in the current window.
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    /// Unix timestamp when the window resets.
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

/// Throttle middleware applying the general tier and, for mutations, the
/// write or clear tier.
///
/// Limiter backend errors fail open. Allowed responses carry the headers
/// of the most specific tier checked.
pub async fn throttle_middleware(
    State(state): State<RateLimiterState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client = extract_client_ip(&request, connect_info.as_ref(), state.trust_forwarded_headers)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    let mut tiers = vec![ThrottleTier::General];
    if let Some(tier) = classify(request.method(), request.uri().path()) {
        tiers.push(tier);
    }

    let mut status = None;
    for tier in tiers {
        match state.limiter.check(RateLimitKey::new(tier, client.as_str())).await {
            Ok(RateLimitResult::Allowed(current)) => status = Some(current),
            Ok(RateLimitResult::Denied(denied)) => return rate_limit_response(&denied),
            Err(e) => {
                tracing::warn!(tier = tier.as_str(), "Rate limiter unavailable: {}", e);
            }
        }
    }

    let mut response = next.run(request).await;
    if let Some(status) = status {
        add_rate_limit_headers(&mut response, &status);
    }
    response
}

/// Returns the mutation tier a request falls under, if any.
pub fn classify(method: &Method, path: &str) -> Option<ThrottleTier> {
    let path = path.trim_end_matches('/');
    let under_records = path == RECORDS_PREFIX || path.starts_with("/api/records/");
    if !under_records {
        return None;
    }

    match *method {
        Method::DELETE if path == CLEAR_PATH => Some(ThrottleTier::Clear),
        Method::POST | Method::PUT | Method::DELETE => Some(ThrottleTier::Write),
        _ => None,
    }
}

/// Extract client IP from request.
pub fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded_headers: bool,
) -> Option<String> {
    client_ip_from_headers(request.headers(), connect_info, trust_forwarded_headers)
}

/// Client identity from headers and socket address.
///
/// With `trust_forwarded_headers`, the order of precedence is:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
///
/// Without it, only the socket address is used.
pub fn client_ip_from_headers(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded_headers: bool,
) -> Option<String> {
    let socket_ip = connect_info.map(|ci| ci.0.ip().to_string());
    if !trust_forwarded_headers {
        return socket_ip;
    }

    if let Some(first_ip) = headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(first_ip.to_string());
    }

    if let Some(real_ip) = headers
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(real_ip.to_string());
    }

    socket_ip
}

/// Create a 429 Too Many Requests response.
fn rate_limit_response(denied: &RateLimitDenied) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "code": "RATE_LIMIT_EXCEEDED",
            "error": "Rate limit exceeded",
            "message": denied.message,
            "retry_after_secs": denied.retry_after_secs
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(denied.limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
    headers.insert("Retry-After", HeaderValue::from(denied.retry_after_secs));

    response
}

/// Add rate limit headers to a response.
fn add_rate_limit_headers(response: &mut Response, status: &RateLimitStatus) {
    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(status.limit));
    headers.insert(
        headers::X_RATELIMIT_REMAINING.clone(),
        HeaderValue::from(status.remaining),
    );
    headers.insert(
        headers::X_RATELIMIT_RESET.clone(),
        HeaderValue::from(status.reset_at.as_unix_secs()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    // ════════════════════════════════════════════════════════════════════════════
    // IP Extraction Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn extract_ip_from_x_forwarded_for() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4, 5.6.7.8")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, None, true);
        assert_eq!(ip, Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_ip_from_x_real_ip() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Real-IP", "9.8.7.6")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, None, true);
        assert_eq!(ip, Some("9.8.7.6".to_string()));
    }

    #[test]
    fn extract_ip_prefers_x_forwarded_for() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4")
            .header("X-Real-IP", "5.6.7.8")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, None, true);
        assert_eq!(ip, Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_ip_falls_back_to_socket_address() {
        let request = Request::builder().uri("/test").body(()).unwrap();
        let addr: SocketAddr = "10.9.8.7:5555".parse().unwrap();

        let ip = extract_client_ip(&request, Some(&ConnectInfo(addr)), true);
        assert_eq!(ip, Some("10.9.8.7".to_string()));
    }

    #[test]
    fn extract_ip_returns_none_without_headers() {
        let request = Request::builder().uri("/test").body(()).unwrap();

        let ip = extract_client_ip(&request, None, true);
        assert_eq!(ip, None);
    }

    #[test]
    fn forwarded_headers_ignored_unless_trusted() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4")
            .header("X-Real-IP", "5.6.7.8")
            .body(())
            .unwrap();
        let addr: SocketAddr = "203.0.113.5:4000".parse().unwrap();

        let ip = extract_client_ip(&request, Some(&ConnectInfo(addr)), false);
        assert_eq!(ip, Some("203.0.113.5".to_string()));

        assert_eq!(extract_client_ip(&request, None, false), None);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Classification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn mutations_are_write_tier() {
        assert_eq!(classify(&Method::POST, "/api/records"), Some(ThrottleTier::Write));
        assert_eq!(classify(&Method::PUT, "/api/records/4"), Some(ThrottleTier::Write));
        assert_eq!(classify(&Method::DELETE, "/api/records/4"), Some(ThrottleTier::Write));
    }

    #[test]
    fn bulk_delete_is_clear_tier() {
        assert_eq!(classify(&Method::DELETE, "/api/records/clear"), Some(ThrottleTier::Clear));
        assert_eq!(classify(&Method::DELETE, "/api/records/clear/"), Some(ThrottleTier::Clear));
    }

    #[test]
    fn reads_and_other_paths_have_no_mutation_tier() {
        assert_eq!(classify(&Method::GET, "/api/records"), None);
        assert_eq!(classify(&Method::GET, "/api/records/statistics"), None);
        assert_eq!(classify(&Method::POST, "/health"), None);
        assert_eq!(classify(&Method::POST, "/api/recordsx"), None);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Response Tests
    // ════════════════════════════════════════════════════════════════════════════

    fn denied(retry_after_secs: u64) -> RateLimitDenied {
        RateLimitDenied {
            limit: 20,
            retry_after_secs,
            tier: ThrottleTier::Write,
            message: ThrottleTier::Write.rejection_message().to_string(),
        }
    }

    #[test]
    fn rate_limit_response_has_429_status() {
        let response = rate_limit_response(&denied(60));
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn rate_limit_response_has_retry_after_header() {
        let response = rate_limit_response(&denied(30));
        let retry_after = response.headers().get("Retry-After").unwrap();
        assert_eq!(retry_after, "30");
    }

    #[test]
    fn rate_limit_response_has_limit_headers() {
        let response = rate_limit_response(&denied(60));
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "20");
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "0");
    }

    #[test]
    fn rate_limiter_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RateLimiterState>();
    }
}
