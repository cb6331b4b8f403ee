//! SyncHub - the entry point transports use to join the real-time feed.
//!
//! Owns the registry and wires the dispatcher, synchronizer and reaper
//! around it. A transport calls `connect` once, forwards inbound signals
//! through `handle_signal`, and calls `disconnect` when the socket ends.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::domain::foundation::{Amount, SessionId, Timestamp};
use crate::ports::RecordStore;

use super::aggregator::StatisticsAggregator;
use super::dispatcher::BroadcastDispatcher;
use super::messages::{BroadcastEvent, ClientSignal};
use super::reaper::{InactivityReaper, ReaperConfig};
use super::registry::{Outbound, SendError, Session, SessionHandle, SessionRegistry};
use super::synchronizer::SnapshotSynchronizer;

/// Smallest outbound buffer that holds the welcome ack and the initial
/// snapshot, both queued before the transport starts draining.
pub const MIN_CHANNEL_CAPACITY: usize = 2;

pub struct SyncHub {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<BroadcastDispatcher>,
    synchronizer: SnapshotSynchronizer,
    aggregator: Arc<StatisticsAggregator>,
    channel_capacity: usize,
}

impl SyncHub {
    pub fn new(store: Arc<dyn RecordStore>, goal: Amount, channel_capacity: usize) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let aggregator = Arc::new(StatisticsAggregator::new(store.clone(), goal));
        let dispatcher = Arc::new(BroadcastDispatcher::new(registry.clone(), aggregator.clone()));
        let synchronizer = SnapshotSynchronizer::new(registry.clone(), store, aggregator.clone());

        Self {
            registry,
            dispatcher,
            synchronizer,
            aggregator,
            channel_capacity: channel_capacity.max(MIN_CHANNEL_CAPACITY),
        }
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    pub fn aggregator(&self) -> Arc<StatisticsAggregator> {
        self.aggregator.clone()
    }

    /// The dispatcher, also usable as the write path's `ChangeNotifier`.
    pub fn dispatcher(&self) -> Arc<BroadcastDispatcher> {
        self.dispatcher.clone()
    }

    /// Registers a new viewer and queues its welcome and initial snapshot.
    ///
    /// The returned receiver must be drained by the transport.
    pub async fn connect(
        &self,
        session_id: SessionId,
        remote_addr: impl Into<String>,
    ) -> (Session, mpsc::Receiver<Outbound>) {
        let (handle, rx) = SessionHandle::channel(self.channel_capacity);
        let session = self.registry.register(session_id, remote_addr, handle).await;

        tracing::info!(
            session_id = %session.id,
            remote_addr = %session.remote_addr,
            "Viewer connected"
        );

        if let Err(e) = self.synchronizer.send_welcome(&session_id).await {
            tracing::warn!(session_id = %session_id, "Welcome could not be delivered: {}", e);
        }

        (session, rx)
    }

    /// Handles one inbound signal from a connected viewer.
    pub async fn handle_signal(
        &self,
        session_id: &SessionId,
        signal: ClientSignal,
    ) -> Result<(), SendError> {
        tracing::debug!(session_id = %session_id, signal = signal.name(), "Signal received");

        match signal {
            ClientSignal::RequestSync => self.synchronizer.resync(session_id).await,
            // send_to refreshes last-activity on success
            ClientSignal::Ping => self.registry.send_to(session_id, BroadcastEvent::pong()).await,
            ClientSignal::RequestStatistics => self.synchronizer.send_statistics(session_id).await,
            ClientSignal::ClientActivity { data } => {
                self.registry.touch(session_id, data).await;
                Ok(())
            }
        }
    }

    /// Removes a viewer after its transport closed.
    pub async fn disconnect(&self, session_id: &SessionId) -> Option<Session> {
        let session = self.registry.remove(session_id).await?;
        let connected_secs = Timestamp::now()
            .duration_since(&session.connected_at)
            .num_seconds();
        tracing::info!(
            session_id = %session.id,
            connected_secs,
            "Viewer disconnected"
        );
        Some(session)
    }

    /// Closes every connection, used on shutdown.
    pub async fn disconnect_all(&self) -> usize {
        let drained = self.registry.drain().await.len();
        if drained > 0 {
            tracing::info!(sessions = drained, "Closed all viewer connections");
        }
        drained
    }

    /// Metadata of every connected viewer.
    pub async fn connected_sessions(&self) -> Vec<Session> {
        self.registry.snapshot().await
    }

    pub async fn session_count(&self) -> usize {
        self.registry.count().await
    }

    /// Starts the inactivity reaper on the runtime.
    pub fn start_reaper(
        &self,
        config: ReaperConfig,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        InactivityReaper::new(self.registry.clone(), config).spawn(shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::InMemoryRecordStore;
    use crate::domain::savings::DEFAULT_SAVINGS_GOAL;

    fn hub() -> SyncHub {
        SyncHub::new(Arc::new(InMemoryRecordStore::new()), DEFAULT_SAVINGS_GOAL, 16)
    }

    fn names(rx: &mut mpsc::Receiver<Outbound>) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            match msg {
                Outbound::Event(event) => names.push(event.name()),
                Outbound::Close => names.push("close"),
            }
        }
        names
    }

    #[tokio::test]
    async fn connect_registers_and_welcomes() {
        let hub = hub();
        let id = SessionId::new();

        let (session, mut rx) = hub.connect(id, "192.168.0.2").await;

        assert_eq!(session.id, id);
        assert_eq!(hub.session_count().await, 1);
        assert_eq!(hub.connected_sessions().await[0].remote_addr, "192.168.0.2");
        assert_eq!(names(&mut rx), vec!["connected", "snapshot"]);
    }

    #[tokio::test]
    async fn ping_answers_with_pong() {
        let hub = hub();
        let id = SessionId::new();
        let (_, mut rx) = hub.connect(id, "x").await;
        names(&mut rx);

        hub.handle_signal(&id, ClientSignal::Ping).await.unwrap();

        assert_eq!(names(&mut rx), vec!["pong"]);
    }

    #[tokio::test]
    async fn ping_refreshes_last_activity() {
        let hub = hub();
        let id = SessionId::new();
        let (session, mut rx) = hub.connect(id, "x").await;
        names(&mut rx);
        let stale = session.connected_at.plus_secs(-3600);
        hub.registry().touch_at(&id, None, stale).await;

        hub.handle_signal(&id, ClientSignal::Ping).await.unwrap();

        let refreshed = hub.registry().get(&id).await.unwrap().last_activity;
        assert!(refreshed > stale);
    }

    #[tokio::test]
    async fn undersized_capacity_still_delivers_welcome_and_snapshot() {
        let hub = SyncHub::new(Arc::new(InMemoryRecordStore::new()), DEFAULT_SAVINGS_GOAL, 1);

        let (_, mut rx) = hub.connect(SessionId::new(), "x").await;

        assert_eq!(names(&mut rx), vec!["connected", "snapshot"]);
    }

    #[tokio::test]
    async fn request_sync_and_statistics_reply_to_sender() {
        let hub = hub();
        let id = SessionId::new();
        let (_, mut rx) = hub.connect(id, "x").await;
        let (_, mut other) = hub.connect(SessionId::new(), "y").await;
        names(&mut rx);
        names(&mut other);

        hub.handle_signal(&id, ClientSignal::RequestSync).await.unwrap();
        hub.handle_signal(&id, ClientSignal::RequestStatistics)
            .await
            .unwrap();

        assert_eq!(names(&mut rx), vec!["snapshot", "statistics_updated"]);
        assert!(names(&mut other).is_empty());
    }

    #[tokio::test]
    async fn client_activity_records_payload_without_reply() {
        let hub = hub();
        let id = SessionId::new();
        let (_, mut rx) = hub.connect(id, "x").await;
        names(&mut rx);

        hub.handle_signal(
            &id,
            ClientSignal::ClientActivity {
                data: Some(serde_json::json!({"tab": "history"})),
            },
        )
        .await
        .unwrap();

        assert!(names(&mut rx).is_empty());
        let session = hub.registry().get(&id).await.unwrap();
        assert_eq!(
            session.last_activity_payload,
            Some(serde_json::json!({"tab": "history"}))
        );
    }

    #[tokio::test]
    async fn signal_from_unknown_session_fails() {
        let hub = hub();
        assert_eq!(
            hub.handle_signal(&SessionId::new(), ClientSignal::Ping).await,
            Err(SendError::SessionNotFound)
        );
    }

    #[tokio::test]
    async fn disconnect_removes_session_once() {
        let hub = hub();
        let id = SessionId::new();
        let _conn = hub.connect(id, "x").await;

        assert!(hub.disconnect(&id).await.is_some());
        assert!(hub.disconnect(&id).await.is_none());
        assert_eq!(hub.session_count().await, 0);
    }

    #[tokio::test]
    async fn disconnect_all_closes_every_connection() {
        let hub = hub();
        let (_, mut a) = hub.connect(SessionId::new(), "a").await;
        let (_, mut b) = hub.connect(SessionId::new(), "b").await;

        assert_eq!(hub.disconnect_all().await, 2);
        assert_eq!(names(&mut a).last(), Some(&"close"));
        assert_eq!(names(&mut b).last(), Some(&"close"));
    }
}
