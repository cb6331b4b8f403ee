//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `store` - In-memory record store
//! - `postgres` - PostgreSQL record store
//! - `rate_limiter` - In-memory mutation throttle
//! - `http` - REST API, health and throttle middleware
//! - `websocket` - Real-time viewer transport

pub mod http;
pub mod postgres;
pub mod rate_limiter;
pub mod store;
pub mod websocket;

pub use rate_limiter::{InMemoryRateLimiter, ThrottleConfig, TierLimit};
pub use store::InMemoryRecordStore;
