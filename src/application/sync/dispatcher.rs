//! Broadcast dispatcher fanning events out to every connected viewer.
//!
//! # Event Flow
//!
//! ```text
//! write path commits to the store
//!          │
//!          ▼
//! ┌─────────────────────┐
//! │ announce_*(record)  │  tagged mutation event
//! └─────────────────────┘
//!          │ fan-out to every session (best-effort)
//!          ▼
//! ┌─────────────────────┐
//! │ publish_statistics  │  recompute, then statistics_updated
//! └─────────────────────┘
//! ```
//!
//! For one mutation the mutation event is handed to every session before
//! statistics start computing. Across concurrent mutations there is no
//! global sequencer: statistics may already include later mutations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::savings::Record;
use crate::ports::ChangeNotifier;

use super::aggregator::StatisticsAggregator;
use super::messages::BroadcastEvent;
use super::registry::SessionRegistry;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct BroadcastDispatcher {
    registry: Arc<SessionRegistry>,
    aggregator: Arc<StatisticsAggregator>,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<SessionRegistry>, aggregator: Arc<StatisticsAggregator>) -> Self {
        Self {
            registry,
            aggregator,
        }
    }

    /// Delivers an event to every registered session.
    ///
    /// A failed send is logged and skipped; it never stops delivery to the
    /// remaining sessions.
    pub async fn broadcast(&self, event: BroadcastEvent) -> DeliveryReport {
        let name = event.name();
        let event = Arc::new(event);
        let mut report = DeliveryReport::default();

        for (session_id, handle) in self.registry.handles().await {
            match handle.deliver(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        session_id = %session_id,
                        event = name,
                        "Broadcast send failed, skipping session: {}",
                        e
                    );
                }
            }
        }

        tracing::debug!(
            event = name,
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast dispatched"
        );
        report
    }

    /// Recomputes statistics and broadcasts them.
    ///
    /// A store failure is logged and swallowed; the next mutation triggers
    /// another publish.
    pub async fn publish_statistics(&self) -> Option<DeliveryReport> {
        match self.aggregator.compute().await {
            Ok(statistics) => Some(
                self.broadcast(BroadcastEvent::statistics_updated(statistics))
                    .await,
            ),
            Err(e) => {
                tracing::error!("Statistics broadcast skipped, compute failed: {}", e);
                None
            }
        }
    }

    async fn announce(&self, event: BroadcastEvent) {
        self.broadcast(event).await;
        self.publish_statistics().await;
    }
}

#[async_trait]
impl ChangeNotifier for BroadcastDispatcher {
    async fn announce_created(&self, record: Record) {
        self.announce(BroadcastEvent::record_added(record)).await;
    }

    async fn announce_updated(&self, record: Record) {
        self.announce(BroadcastEvent::record_updated(record)).await;
    }

    async fn announce_deleted(&self, record: Record) {
        self.announce(BroadcastEvent::record_deleted(record)).await;
    }

    async fn announce_cleared(&self, deleted_count: u64) {
        self.announce(BroadcastEvent::records_cleared(deleted_count))
            .await;
    }
}
