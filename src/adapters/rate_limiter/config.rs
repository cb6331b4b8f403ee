//! Throttle configuration types.
//!
//! One fixed-window limit per tier. Deserializable so it can sit directly
//! in the application configuration.

use serde::{Deserialize, Serialize};

use crate::ports::ThrottleTier;

/// Limit for one tier: at most `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimit {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl TierLimit {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    pub fn window_millis(&self) -> i64 {
        i64::try_from(self.window_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

/// Complete throttle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Applies to every request.
    #[serde(default = "default_general")]
    pub general: TierLimit,
    /// Create, update and delete of single records.
    #[serde(default = "default_write")]
    pub write: TierLimit,
    /// Bulk delete of every record.
    #[serde(default = "default_clear")]
    pub clear: TierLimit,
}

impl ThrottleConfig {
    pub fn limit_for(&self, tier: ThrottleTier) -> TierLimit {
        match tier {
            ThrottleTier::General => self.general,
            ThrottleTier::Write => self.write,
            ThrottleTier::Clear => self.clear,
        }
    }

    /// Returns the first tier whose limit or window is zero.
    pub fn first_invalid_tier(&self) -> Option<ThrottleTier> {
        [ThrottleTier::General, ThrottleTier::Write, ThrottleTier::Clear]
            .into_iter()
            .find(|tier| {
                let limit = self.limit_for(*tier);
                limit.max_requests == 0 || limit.window_secs == 0
            })
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            general: default_general(),
            write: default_write(),
            clear: default_clear(),
        }
    }
}

fn default_general() -> TierLimit {
    TierLimit::new(100, 15 * 60)
}

fn default_write() -> TierLimit {
    TierLimit::new(20, 5 * 60)
}

fn default_clear() -> TierLimit {
    TierLimit::new(3, 60 * 60)
}
