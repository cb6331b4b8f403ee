//! In-memory rate limiter implementation.
//!
//! Uses a fixed-window counter algorithm with an in-memory HashMap.
//! Counters are per process; a multi-server deployment would need a
//! shared backend.
//!
//! Expired windows are pruned once the map reaches `prune_threshold`
//! entries, at most once per second.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::ThrottleConfig;

/// Entry count at which expired windows start being pruned.
const DEFAULT_PRUNE_THRESHOLD: usize = 10_000;

/// Minimum spacing between two prune passes.
const PRUNE_SPACING_MS: i64 = 1_000;

/// In-memory rate limiter for single-server deployments.
///
/// Each key tracks the count of requests in its current window. A window
/// opens on the first request after the previous one expired.
#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    config: ThrottleConfig,
    prune_threshold: usize,
    windows: Arc<RwLock<Windows>>,
}

#[derive(Debug, Default)]
struct Windows {
    entries: HashMap<String, WindowState>,
    last_prune_ms: Option<i64>,
}

/// State for a single rate limit window.
#[derive(Debug, Clone)]
struct WindowState {
    /// Number of requests accepted in the current window.
    count: u32,
    /// When the current window ends, in unix milliseconds.
    window_end_ms: i64,
}

impl Windows {
    fn purge_expired(&mut self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, state| now_ms < state.window_end_ms);
        self.last_prune_ms = Some(now_ms);
        before - self.entries.len()
    }

    fn prune_due(&self, threshold: usize, now_ms: i64) -> bool {
        self.entries.len() >= threshold
            && self
                .last_prune_ms
                .map_or(true, |last| now_ms.saturating_sub(last) >= PRUNE_SPACING_MS)
    }
}

impl InMemoryRateLimiter {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            windows: Arc::new(RwLock::new(Windows::default())),
        }
    }

    /// Create a rate limiter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ThrottleConfig::default())
    }

    pub fn with_prune_threshold(mut self, threshold: usize) -> Self {
        self.prune_threshold = threshold.max(1);
        self
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Number of tracked windows, expired or not.
    pub async fn tracked_windows(&self) -> usize {
        self.windows.read().await.entries.len()
    }

    /// Drops every window that has ended as of `now`, returning how many.
    pub async fn purge_expired(&self, now: Timestamp) -> usize {
        self.windows.write().await.purge_expired(now.as_unix_millis())
    }

    /// Checks a key as of `now`, consuming quota if allowed.
    pub async fn check_at(&self, key: RateLimitKey, now: Timestamp) -> RateLimitResult {
        let limit = self.config.limit_for(key.tier);
        let now_ms = now.as_unix_millis();
        let fresh_end_ms = now_ms.saturating_add(limit.window_millis());

        let mut windows = self.windows.write().await;

        if windows.prune_due(self.prune_threshold, now_ms) {
            let purged = windows.purge_expired(now_ms);
            tracing::debug!(purged, remaining = windows.entries.len(), "Pruned throttle windows");
        }

        let state = windows
            .entries
            .entry(key.storage_key())
            .or_insert_with(|| WindowState {
                count: 0,
                window_end_ms: fresh_end_ms,
            });

        if now_ms >= state.window_end_ms {
            state.count = 0;
            state.window_end_ms = fresh_end_ms;
        }

        let window_end_ms = state.window_end_ms;

        if state.count >= limit.max_requests {
            let remaining_ms = window_end_ms.saturating_sub(now_ms).max(0) as u64;
            let retry_after_secs = remaining_ms.div_ceil(1000).max(1);

            tracing::warn!(
                tier = key.tier.as_str(),
                client = %key.client,
                retry_after_secs,
                "Throttle limit reached"
            );

            return RateLimitResult::Denied(RateLimitDenied {
                limit: limit.max_requests,
                retry_after_secs,
                tier: key.tier,
                message: key.tier.rejection_message().to_string(),
            });
        }

        state.count += 1;

        RateLimitResult::Allowed(RateLimitStatus {
            limit: limit.max_requests,
            remaining: limit.max_requests.saturating_sub(state.count),
            reset_at: Timestamp::from_unix_millis(window_end_ms),
            window_secs: limit.window_secs,
        })
    }

    /// Reads the status of a key as of `now` without consuming quota.
    pub async fn status_at(&self, key: &RateLimitKey, now: Timestamp) -> RateLimitStatus {
        let limit = self.config.limit_for(key.tier);
        let now_ms = now.as_unix_millis();

        let windows = self.windows.read().await;

        let (count, window_end_ms) = windows
            .entries
            .get(&key.storage_key())
            .filter(|state| now_ms < state.window_end_ms)
            .map(|state| (state.count, state.window_end_ms))
            .unwrap_or((0, now_ms.saturating_add(limit.window_millis())));

        RateLimitStatus {
            limit: limit.max_requests,
            remaining: limit.max_requests.saturating_sub(count),
            reset_at: Timestamp::from_unix_millis(window_end_ms),
            window_secs: limit.window_secs,
        }
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check_at(key, Timestamp::now()).await)
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        Ok(self.status_at(&key, Timestamp::now()).await)
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        let mut windows = self.windows.write().await;
        windows.entries.remove(&key.storage_key());
        Ok(())
    }
}
