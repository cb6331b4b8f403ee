//! HTTP middleware for axum.
//!
//! - `rate_limit` - Tiered mutation throttle

pub mod rate_limit;

pub use rate_limit::{
    classify, client_ip_from_headers, extract_client_ip, throttle_middleware, RateLimiterState,
    UNKNOWN_CLIENT,
};
