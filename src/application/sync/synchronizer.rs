//! Snapshot synchronizer.
//!
//! Builds the full current state (every record plus fresh statistics) and
//! delivers it to a single session, on join and on manual pull. It is the
//! only way for a viewer to recover from a missed broadcast. It reads from
//! the store and never writes to it.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, SessionId};
use crate::ports::RecordStore;

use super::aggregator::StatisticsAggregator;
use super::messages::BroadcastEvent;
use super::registry::{SendError, SessionRegistry};

pub struct SnapshotSynchronizer {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn RecordStore>,
    aggregator: Arc<StatisticsAggregator>,
}

impl SnapshotSynchronizer {
    pub fn new(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn RecordStore>,
        aggregator: Arc<StatisticsAggregator>,
    ) -> Self {
        Self {
            registry,
            store,
            aggregator,
        }
    }

    /// Acknowledges a new connection, then sends it a snapshot.
    pub async fn send_welcome(&self, session_id: &SessionId) -> Result<(), SendError> {
        self.registry
            .send_to(session_id, BroadcastEvent::connected(*session_id))
            .await?;
        self.deliver_snapshot(session_id, "Failed to load initial data")
            .await
    }

    /// Sends a snapshot on explicit request.
    ///
    /// A store failure becomes a `sync_error` for this session only; there
    /// is no automatic retry.
    pub async fn resync(&self, session_id: &SessionId) -> Result<(), SendError> {
        tracing::debug!(session_id = %session_id, "Resync requested");
        self.deliver_snapshot(session_id, "Failed to synchronize data")
            .await
    }

    /// Sends freshly computed statistics to one session.
    pub async fn send_statistics(&self, session_id: &SessionId) -> Result<(), SendError> {
        let event = match self.aggregator.compute().await {
            Ok(statistics) => BroadcastEvent::statistics_updated(statistics),
            Err(e) => {
                tracing::error!(session_id = %session_id, "Statistics request failed: {}", e);
                BroadcastEvent::sync_error("Failed to load statistics")
            }
        };
        self.registry.send_to(session_id, event).await
    }

    /// Reads records and statistics. Holds no registry lock.
    pub async fn build_snapshot(&self) -> Result<BroadcastEvent, DomainError> {
        let records = self.store.list_all().await?;
        let statistics = self.aggregator.compute().await?;
        Ok(BroadcastEvent::snapshot(records, statistics))
    }

    async fn deliver_snapshot(
        &self,
        session_id: &SessionId,
        failure_message: &str,
    ) -> Result<(), SendError> {
        let event = match self.build_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(session_id = %session_id, "Snapshot build failed: {}", e);
                BroadcastEvent::sync_error(failure_message)
            }
        };
        self.registry.send_to(session_id, event).await
    }
}
