//! Message types exchanged with connected viewers.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: connection acknowledgement, snapshots, mutation
//!   events, statistics, sync errors, pongs
//! - Client → Server: resync requests, pings, statistics requests,
//!   activity reports

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::savings::{Record, Statistics};

// ============================================
// Server → Client Messages
// ============================================

/// Every event the server can push to a viewer.
///
/// Fire-and-forget: there is no event log and no replay. A viewer that
/// misses one recovers through a resync.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastEvent {
    /// Connection acknowledged.
    Connected(ConnectedPayload),

    /// Full current state.
    Snapshot(SnapshotPayload),

    RecordAdded(RecordPayload),

    RecordUpdated(RecordPayload),

    RecordDeleted(RecordPayload),

    RecordsCleared(ClearedPayload),

    StatisticsUpdated(StatisticsPayload),

    /// Snapshot or statistics could not be built for the requesting viewer.
    SyncError(SyncErrorPayload),

    /// Liveness reply.
    Pong(PongPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedPayload {
    pub session_id: SessionId,
    pub message: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotPayload {
    pub records: Vec<Record>,
    pub statistics: Statistics,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPayload {
    pub record: Record,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearedPayload {
    pub deleted_count: u64,
    pub timestamp: Timestamp,
}

/// Statistics fields sit at the top level of the event, next to `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsPayload {
    #[serde(flatten)]
    pub statistics: Statistics,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncErrorPayload {
    pub message: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PongPayload {
    pub timestamp: Timestamp,
}

impl BroadcastEvent {
    pub fn connected(session_id: SessionId) -> Self {
        BroadcastEvent::Connected(ConnectedPayload {
            session_id,
            message: "Connected to the sync server".to_string(),
            timestamp: Timestamp::now(),
        })
    }

    pub fn snapshot(records: Vec<Record>, statistics: Statistics) -> Self {
        BroadcastEvent::Snapshot(SnapshotPayload {
            records,
            statistics,
            timestamp: Timestamp::now(),
        })
    }

    pub fn record_added(record: Record) -> Self {
        BroadcastEvent::RecordAdded(RecordPayload {
            record,
            timestamp: Timestamp::now(),
        })
    }

    pub fn record_updated(record: Record) -> Self {
        BroadcastEvent::RecordUpdated(RecordPayload {
            record,
            timestamp: Timestamp::now(),
        })
    }

    pub fn record_deleted(record: Record) -> Self {
        BroadcastEvent::RecordDeleted(RecordPayload {
            record,
            timestamp: Timestamp::now(),
        })
    }

    pub fn records_cleared(deleted_count: u64) -> Self {
        BroadcastEvent::RecordsCleared(ClearedPayload {
            deleted_count,
            timestamp: Timestamp::now(),
        })
    }

    pub fn statistics_updated(statistics: Statistics) -> Self {
        BroadcastEvent::StatisticsUpdated(StatisticsPayload {
            statistics,
            timestamp: Timestamp::now(),
        })
    }

    pub fn sync_error(message: impl Into<String>) -> Self {
        BroadcastEvent::SyncError(SyncErrorPayload {
            message: message.into(),
            timestamp: Timestamp::now(),
        })
    }

    pub fn pong() -> Self {
        BroadcastEvent::Pong(PongPayload {
            timestamp: Timestamp::now(),
        })
    }

    /// Wire name of the event, as it appears in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::Connected(_) => "connected",
            BroadcastEvent::Snapshot(_) => "snapshot",
            BroadcastEvent::RecordAdded(_) => "record_added",
            BroadcastEvent::RecordUpdated(_) => "record_updated",
            BroadcastEvent::RecordDeleted(_) => "record_deleted",
            BroadcastEvent::RecordsCleared(_) => "records_cleared",
            BroadcastEvent::StatisticsUpdated(_) => "statistics_updated",
            BroadcastEvent::SyncError(_) => "sync_error",
            BroadcastEvent::Pong(_) => "pong",
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            BroadcastEvent::Connected(p) => p.timestamp,
            BroadcastEvent::Snapshot(p) => p.timestamp,
            BroadcastEvent::RecordAdded(p)
            | BroadcastEvent::RecordUpdated(p)
            | BroadcastEvent::RecordDeleted(p) => p.timestamp,
            BroadcastEvent::RecordsCleared(p) => p.timestamp,
            BroadcastEvent::StatisticsUpdated(p) => p.timestamp,
            BroadcastEvent::SyncError(p) => p.timestamp,
            BroadcastEvent::Pong(p) => p.timestamp,
        }
    }

    /// Serializes the event to its JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// Inbound signals a viewer may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientSignal {
    /// Manual pull of the full state.
    RequestSync,

    /// Liveness ping.
    Ping,

    /// Pull of statistics only.
    RequestStatistics,

    /// Arbitrary activity report from the viewer.
    ClientActivity {
        #[serde(default)]
        data: Option<serde_json::Value>,
    },
}

impl ClientSignal {
    pub fn name(&self) -> &'static str {
        match self {
            ClientSignal::RequestSync => "request_sync",
            ClientSignal::Ping => "ping",
            ClientSignal::RequestStatistics => "request_statistics",
            ClientSignal::ClientActivity { .. } => "client_activity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Amount, RecordId};
    use crate::domain::savings::{RecordAggregate, DEFAULT_SAVINGS_GOAL};
    use chrono::NaiveDate;

    fn test_record() -> Record {
        Record {
            id: RecordId::new(1),
            amount: Amount::from_cents(2_500),
            description: "tips".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = BroadcastEvent::record_added(test_record()).to_json().unwrap();
        assert!(json.contains(r#""type":"record_added""#));
        assert!(json.contains(r#""amount":25.0"#));
    }

    #[test]
    fn records_cleared_carries_count() {
        let json = BroadcastEvent::records_cleared(4).to_json().unwrap();
        assert!(json.contains(r#""type":"records_cleared""#));
        assert!(json.contains(r#""deleted_count":4"#));
    }

    #[test]
    fn statistics_fields_are_flattened() {
        let stats = Statistics::derive(&RecordAggregate::default(), DEFAULT_SAVINGS_GOAL);
        let value: serde_json::Value =
            serde_json::from_str(&BroadcastEvent::statistics_updated(stats).to_json().unwrap())
                .unwrap();
        assert_eq!(value["type"], "statistics_updated");
        assert_eq!(value["total_count"], 0);
        assert_eq!(value["remaining"], 10000.0);
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn name_matches_serialized_tag() {
        let events = [
            BroadcastEvent::connected(SessionId::new()),
            BroadcastEvent::records_cleared(0),
            BroadcastEvent::sync_error("boom"),
            BroadcastEvent::pong(),
        ];
        for event in events {
            let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
            assert_eq!(value["type"], event.name());
        }
    }

    #[test]
    fn client_signal_deserializes_request_sync() {
        let msg: ClientSignal = serde_json::from_str(r#"{"type": "request_sync"}"#).unwrap();
        assert_eq!(msg, ClientSignal::RequestSync);
    }

    #[test]
    fn client_signal_deserializes_activity_with_and_without_data() {
        let msg: ClientSignal =
            serde_json::from_str(r#"{"type": "client_activity", "data": {"view": "list"}}"#)
                .unwrap();
        assert!(matches!(msg, ClientSignal::ClientActivity { data: Some(_) }));

        let msg: ClientSignal = serde_json::from_str(r#"{"type": "client_activity"}"#).unwrap();
        assert_eq!(msg, ClientSignal::ClientActivity { data: None });
    }

    #[test]
    fn unknown_client_signal_is_rejected() {
        assert!(serde_json::from_str::<ClientSignal>(r#"{"type": "shutdown"}"#).is_err());
    }
}
