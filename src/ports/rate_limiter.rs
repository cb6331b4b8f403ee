//! Rate limiting port for bounding how fast mutations reach the store.
//!
//! Every accepted mutation fans out at least two broadcast events, so the
//! throttle is what keeps the broadcast dispatcher from being flooded.
//! Limits are tiered and keyed by client network identity; each tier is an
//! independent fixed-window counter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

/// Port for rate limiting operations.
///
/// Implementations should be thread-safe and support concurrent access.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check if request is allowed, consuming one unit of quota if so.
    ///
    /// Returns `Allowed` with remaining quota or `Denied` with retry info.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;

    /// Get current rate limit status without consuming quota.
    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError>;

    /// Reset rate limit for a key (admin operation).
    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError>;
}

/// The class of operation a counter applies to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleTier {
    /// Every request.
    General,
    /// Create, update or delete of a single record.
    Write,
    /// Bulk delete of all records.
    Clear,
}

impl ThrottleTier {
    /// Returns the string representation of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThrottleTier::General => "general",
            ThrottleTier::Write => "write",
            ThrottleTier::Clear => "clear",
        }
    }

    /// Human-readable rejection text for this tier.
    pub fn rejection_message(&self) -> &'static str {
        match self {
            ThrottleTier::General => "Too many requests. Try again later.",
            ThrottleTier::Write => "Too many write operations. Try again later.",
            ThrottleTier::Clear => "Too many clear operations. Try again later.",
        }
    }
}

impl fmt::Display for ThrottleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key identifying one counter: a tier plus the client identity.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub tier: ThrottleTier,
    /// Client network identity (usually an IP address).
    pub client: String,
}

impl RateLimitKey {
    pub fn new(tier: ThrottleTier, client: impl Into<String>) -> Self {
        Self {
            tier,
            client: client.into(),
        }
    }

    pub fn general(client: &str) -> Self {
        Self::new(ThrottleTier::General, client)
    }

    pub fn write(client: &str) -> Self {
        Self::new(ThrottleTier::Write, client)
    }

    pub fn clear(client: &str) -> Self {
        Self::new(ThrottleTier::Clear, client)
    }

    /// Returns the storage key string for this rate limit key.
    pub fn storage_key(&self) -> String {
        format!("throttle:{}:{}", self.tier.as_str(), self.client)
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed; includes current status.
    Allowed(RateLimitStatus),
    /// Request is denied; includes denial details.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    /// Returns true if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    /// Returns true if the request was denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Current rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining requests in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: Timestamp,
    /// Window duration in seconds.
    pub window_secs: u64,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining window time, rounded up to whole seconds.
    pub retry_after_secs: u64,
    /// The tier that triggered the denial.
    pub tier: ThrottleTier,
    /// Human-readable message explaining the denial.
    pub message: String,
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
