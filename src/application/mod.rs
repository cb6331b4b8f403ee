//! Application layer - Write-path handlers and the real-time sync core.
//!
//! `handlers` commits mutations and announces them; `sync` turns those
//! announcements into events for every connected viewer.

pub mod handlers;
pub mod sync;

pub use handlers::RecordCommands;
pub use sync::SyncHub;
