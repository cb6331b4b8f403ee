//! Rate limiter adapters.
//!
//! Implementations of the RateLimiter port.
//!
//! ## Available Adapters
//!
//! - `InMemoryRateLimiter` - Fixed-window counters held in process memory
//!
//! ## Usage
//!
//! ```ignore
//! use savings_tracker::adapters::rate_limiter::{InMemoryRateLimiter, ThrottleConfig};
//!
//! let limiter = InMemoryRateLimiter::new(ThrottleConfig::default());
//! ```

mod config;
mod in_memory;

pub use config::{ThrottleConfig, TierLimit};
pub use in_memory::InMemoryRateLimiter;
