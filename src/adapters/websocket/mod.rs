//! WebSocket transport for real-time viewers.
//!
//! ```text
//! socket ──text frames──▶ ClientSignal ──▶ SyncHub::handle_signal
//! socket ◀──JSON────────── Outbound    ◀── per-session channel
//! ```

pub mod handler;

pub use handler::{websocket_router, ws_handler, WebSocketState};
