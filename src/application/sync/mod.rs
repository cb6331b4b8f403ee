//! Real-time synchronization of savings data to connected viewers.
//!
//! - `registry` - Who is connected and how to reach them
//! - `dispatcher` - Fan-out of mutation and statistics events
//! - `synchronizer` - Full snapshots on join and on request
//! - `aggregator` - Statistics recomputed from the store
//! - `reaper` - Eviction of idle sessions
//! - `hub` - Facade the transport talks to

mod aggregator;
mod dispatcher;
mod hub;
mod messages;
mod reaper;
mod registry;
mod synchronizer;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::StatisticsAggregator;
pub use dispatcher::{BroadcastDispatcher, DeliveryReport};
pub use hub::{SyncHub, MIN_CHANNEL_CAPACITY};
pub use messages::{
    BroadcastEvent, ClearedPayload, ClientSignal, ConnectedPayload, PongPayload, RecordPayload,
    SnapshotPayload, StatisticsPayload, SyncErrorPayload,
};
pub use reaper::{InactivityReaper, ReaperConfig};
pub use registry::{Outbound, SendError, Session, SessionHandle, SessionRegistry};
pub use synchronizer::SnapshotSynchronizer;
