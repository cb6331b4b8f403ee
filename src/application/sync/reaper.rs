//! Inactivity reaper - periodic eviction of abandoned sessions.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 10 min | How often a sweep runs |
//! | `max_idle` | 30 min | Idle time after which a session is evicted |
//!
//! A sweep is a point-in-time pass, so a session can outlive true
//! inactivity by up to `interval + max_idle`.
//!
//! ## Graceful Shutdown
//!
//! The loop listens on a `watch` channel and exits when it flips to `true`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::domain::foundation::Timestamp;

use super::registry::SessionRegistry;

/// Floor applied to the sweep interval; `tokio::time::interval` rejects zero.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the InactivityReaper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaperConfig {
    /// Time between sweeps.
    pub interval: Duration,

    /// Sessions idle longer than this are evicted.
    pub max_idle: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            max_idle: Duration::from_secs(30 * 60),
        }
    }
}

impl ReaperConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle = max_idle;
        self
    }
}

/// Background service evicting idle sessions from the registry.
pub struct InactivityReaper {
    registry: Arc<SessionRegistry>,
    config: ReaperConfig,
}

impl InactivityReaper {
    pub fn new(registry: Arc<SessionRegistry>, config: ReaperConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &ReaperConfig {
        &self.config
    }

    /// Runs one sweep against the current time.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Timestamp::now()).await
    }

    /// Runs one sweep as of `now`, returning how many sessions were evicted.
    pub async fn sweep_at(&self, now: Timestamp) -> usize {
        let max_idle = chrono::Duration::from_std(self.config.max_idle)
            .unwrap_or(chrono::Duration::MAX);
        let evicted = self.registry.evict_idle(now, max_idle).await;

        for session in &evicted {
            tracing::debug!(
                session_id = %session.id,
                remote_addr = %session.remote_addr,
                idle_secs = session.idle_for(now).num_seconds(),
                "Evicted inactive session"
            );
        }
        if !evicted.is_empty() {
            tracing::info!(evicted = evicted.len(), "Inactive sessions removed");
        }
        evicted.len()
    }

    /// Sweeps every `interval` until shutdown is signalled.
    ///
    /// A zero interval is raised to one millisecond.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.interval.max(MIN_SWEEP_INTERVAL);
        if period != self.config.interval {
            tracing::warn!("Reaper interval is zero, sweeping every millisecond");
        }
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Inactivity reaper stopping");
                        return;
                    }
                }

                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    /// Spawns the loop on the runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            max_idle_secs = self.config.max_idle.as_secs(),
            "Inactivity reaper started"
        );
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sync::registry::SessionHandle;
    use crate::domain::foundation::SessionId;

    const MAX_IDLE_SECS: i64 = 30 * 60;
    const INTERVAL_SECS: i64 = 10 * 60;

    async fn registry_with_session() -> (Arc<SessionRegistry>, SessionId, Timestamp) {
        let registry = Arc::new(SessionRegistry::new());
        let id = SessionId::new();
        let (handle, rx) = SessionHandle::channel(4);
        std::mem::forget(rx);
        let session = registry.register(id, "10.1.1.1", handle).await;
        (registry, id, session.last_activity)
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = ReaperConfig::default();
        assert_eq!(config.interval, Duration::from_secs(600));
        assert_eq!(config.max_idle, Duration::from_secs(1800));
    }

    #[tokio::test]
    async fn sweep_just_before_max_idle_keeps_session() {
        let (registry, id, touched) = registry_with_session().await;
        let reaper = InactivityReaper::new(registry.clone(), ReaperConfig::default());

        let evicted = reaper
            .sweep_at(touched.plus_secs(MAX_IDLE_SECS).plus_millis(-1))
            .await;

        assert_eq!(evicted, 0);
        assert!(registry.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn sweep_after_max_idle_plus_interval_evicts() {
        let (registry, id, touched) = registry_with_session().await;
        let reaper = InactivityReaper::new(registry.clone(), ReaperConfig::default());

        let evicted = reaper
            .sweep_at(touched.plus_secs(MAX_IDLE_SECS + INTERVAL_SECS))
            .await;

        assert_eq!(evicted, 1);
        assert!(registry.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn touch_postpones_eviction() {
        let (registry, id, touched) = registry_with_session().await;
        let reaper = InactivityReaper::new(registry.clone(), ReaperConfig::default());

        registry
            .touch_at(&id, None, touched.plus_secs(MAX_IDLE_SECS))
            .await;

        assert_eq!(reaper.sweep_at(touched.plus_secs(MAX_IDLE_SECS + 60)).await, 0);
    }

    #[tokio::test]
    async fn sweep_tolerates_sessions_whose_transport_is_gone() {
        let registry = Arc::new(SessionRegistry::new());
        let (handle, rx) = SessionHandle::channel(1);
        drop(rx);
        let session = registry.register(SessionId::new(), "x", handle).await;
        let reaper = InactivityReaper::new(registry.clone(), ReaperConfig::default());

        let evicted = reaper
            .sweep_at(session.last_activity.plus_secs(MAX_IDLE_SECS + 1))
            .await;

        assert_eq!(evicted, 1);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn run_sweeps_on_interval_and_stops_on_shutdown() {
        let registry = Arc::new(SessionRegistry::new());
        let (handle, _rx) = SessionHandle::channel(4);
        registry.register(SessionId::new(), "x", handle).await;

        let config = ReaperConfig::default()
            .with_interval(Duration::from_millis(20))
            .with_max_idle(Duration::from_millis(1));
        let (tx, rx) = watch::channel(false);
        let task = InactivityReaper::new(registry.clone(), config).spawn(rx);

        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(registry.count().await, 0);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn zero_interval_runs_without_panicking() {
        let registry = Arc::new(SessionRegistry::new());
        let config = ReaperConfig::default().with_interval(Duration::ZERO);
        let (tx, rx) = watch::channel(false);
        let task = InactivityReaper::new(registry, config).spawn(rx);

        time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        assert!(task.await.is_ok());
    }
}
