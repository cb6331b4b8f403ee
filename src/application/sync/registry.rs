//! Session registry for connected viewers.
//!
//! The registry exclusively owns the map from session id to session
//! metadata and the session's outbound connection handle. Everything else
//! (dispatcher, synchronizer, reaper) goes through the operations below.
//!
//! # Thread Safety
//!
//! Uses `RwLock` for the map since fan-out reads vastly outnumber
//! joins/leaves. No lock is held across a send or a store read: fan-out
//! copies the handles out, releases the lock, then delivers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{SessionId, Timestamp};

use super::messages::BroadcastEvent;

/// Message placed on a session's outbound channel.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Event to forward to the viewer.
    Event(Arc<BroadcastEvent>),
    /// Ask the transport to close the connection.
    Close,
}

/// Per-session delivery failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("session is not registered")]
    SessionNotFound,

    #[error("session channel is closed")]
    ChannelClosed,

    #[error("session outbound buffer is full")]
    ChannelFull,
}

/// Outbound connection handle of one session.
///
/// Sends never block: a full buffer is a failed send, not back-pressure.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Outbound>,
}

impl SessionHandle {
    /// Creates a handle and the receiver the transport drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn deliver(&self, event: Arc<BroadcastEvent>) -> Result<(), SendError> {
        self.push(Outbound::Event(event))
    }

    pub fn close(&self) -> Result<(), SendError> {
        self.push(Outbound::Close)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn push(&self, msg: Outbound) -> Result<(), SendError> {
        self.tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}

/// Identity and liveness metadata of a connected viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub remote_addr: String,
    pub connected_at: Timestamp,
    pub last_activity: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_payload: Option<serde_json::Value>,
}

impl Session {
    fn new(id: SessionId, remote_addr: String, now: Timestamp) -> Self {
        Self {
            id,
            remote_addr,
            connected_at: now,
            last_activity: now,
            last_activity_payload: None,
        }
    }

    /// Time since the last inbound signal or direct send.
    pub fn idle_for(&self, now: Timestamp) -> Duration {
        now.duration_since(&self.last_activity)
    }
}

struct SessionEntry {
    session: Session,
    handle: SessionHandle,
}

/// Tracks every connected viewer.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session and takes ownership of its handle.
    ///
    /// A duplicate id is a transport logic error: it is logged and the
    /// prior entry is replaced (its handle dropped).
    pub async fn register(
        &self,
        id: SessionId,
        remote_addr: impl Into<String>,
        handle: SessionHandle,
    ) -> Session {
        let session = Session::new(id, remote_addr.into(), Timestamp::now());
        let entry = SessionEntry {
            session: session.clone(),
            handle,
        };

        let replaced = self.sessions.write().await.insert(id, entry);
        if let Some(prior) = replaced {
            tracing::warn!(
                session_id = %id,
                prior_remote_addr = %prior.session.remote_addr,
                "Duplicate session id registered, replacing prior entry"
            );
        }
        session
    }

    /// Refreshes last-activity and optionally stores the activity payload.
    ///
    /// No-op if the session has already gone.
    pub async fn touch(&self, id: &SessionId, payload: Option<serde_json::Value>) {
        self.touch_at(id, payload, Timestamp::now()).await;
    }

    pub(crate) async fn touch_at(
        &self,
        id: &SessionId,
        payload: Option<serde_json::Value>,
        now: Timestamp,
    ) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(id) {
            entry.session.last_activity = now;
            if payload.is_some() {
                entry.session.last_activity_payload = payload;
            }
        }
    }

    /// Deletes a session, returning its final metadata if it was present.
    pub async fn remove(&self, id: &SessionId) -> Option<Session> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|entry| entry.session)
    }

    pub async fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|entry| entry.session.clone())
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Read-only copy of every session's metadata.
    pub async fn snapshot(&self) -> Vec<Session> {
        self.sessions
            .read()
            .await
            .values()
            .map(|entry| entry.session.clone())
            .collect()
    }

    /// Sends one event to one session and counts it as activity.
    pub async fn send_to(&self, id: &SessionId, event: BroadcastEvent) -> Result<(), SendError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(id)
            .map(|entry| entry.handle.clone())
            .ok_or(SendError::SessionNotFound)?;

        handle.deliver(Arc::new(event))?;
        self.touch(id, None).await;
        Ok(())
    }

    /// Copies out every handle so fan-out can run without the lock.
    pub(crate) async fn handles(&self) -> Vec<(SessionId, SessionHandle)> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, entry)| (*id, entry.handle.clone()))
            .collect()
    }

    /// Removes every session idle for longer than `max_idle` at `now`.
    ///
    /// Each evicted connection is asked to close; a close that cannot be
    /// queued is logged and skipped.
    pub async fn evict_idle(&self, now: Timestamp, max_idle: Duration) -> Vec<Session> {
        let evicted: Vec<SessionEntry> = {
            let mut sessions = self.sessions.write().await;
            let stale: Vec<SessionId> = sessions
                .iter()
                .filter(|(_, entry)| entry.session.idle_for(now) > max_idle)
                .map(|(id, _)| *id)
                .collect();
            stale
                .iter()
                .filter_map(|id| sessions.remove(id))
                .collect()
        };

        evicted
            .into_iter()
            .map(|entry| {
                if let Err(e) = entry.handle.close() {
                    tracing::debug!(
                        session_id = %entry.session.id,
                        "Could not signal close to evicted session: {}",
                        e
                    );
                }
                entry.session
            })
            .collect()
    }

    /// Empties the registry, asking every connection to close.
    pub async fn drain(&self) -> Vec<Session> {
        let drained: Vec<SessionEntry> = self
            .sessions
            .write()
            .await
            .drain()
            .map(|(_, entry)| entry)
            .collect();

        drained
            .into_iter()
            .map(|entry| {
                let _ = entry.handle.close();
                entry.session
            })
            .collect()
    }
}
