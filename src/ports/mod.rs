//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `RecordStore` - Persistence of savings records
//! - `ChangeNotifier` - Write path → real-time viewers
//! - `RateLimiter` - Tiered mutation throttle

mod change_notifier;
mod rate_limiter;
mod record_store;

pub use change_notifier::ChangeNotifier;
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
    ThrottleTier,
};
pub use record_store::RecordStore;
