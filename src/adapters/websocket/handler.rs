//! WebSocket upgrade handler for real-time viewers.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Register with the hub (welcome and snapshot are queued)
//! 3. Pump outbound events to the socket, inbound signals to the hub
//! 4. Disconnect from the hub when either side ends

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::adapters::http::middleware::{client_ip_from_headers, UNKNOWN_CLIENT};
use crate::application::sync::{ClientSignal, Outbound, SendError, SyncHub};
use crate::domain::foundation::SessionId;

/// State for the WebSocket endpoint.
#[derive(Clone)]
pub struct WebSocketState {
    hub: Arc<SyncHub>,
    trust_forwarded_headers: bool,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
///
/// Connections are not authenticated.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WebSocketState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let remote_addr = client_ip_from_headers(
        &headers,
        connect_info.as_ref(),
        state.trust_forwarded_headers,
    )
    .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    let hub = state.hub;
    ws.on_upgrade(move |socket| handle_socket(socket, hub, remote_addr))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection. The session id is assigned
/// here, one per socket.
async fn handle_socket(socket: WebSocket, hub: Arc<SyncHub>, remote_addr: String) {
    let (sender, mut receiver) = socket.split();
    let session_id = SessionId::new();

    let (_, outbound) = hub.connect(session_id, remote_addr).await;

    let mut send_task = tokio::spawn(pump_outbound(sender, outbound, session_id));

    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientSignal>(&text) {
                    Ok(signal) => {
                        if let Err(e) = recv_hub.handle_signal(&session_id, signal).await {
                            tracing::debug!(session_id = %session_id, "Signal reply failed: {}", e);
                            if e == SendError::SessionNotFound {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::debug!(
                            session_id = %session_id,
                            "Ignoring unparseable signal: {}",
                            e
                        );
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::debug!(session_id = %session_id, "Ignoring binary frame");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // WebSocket protocol ping/pong - handled automatically by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(session_id = %session_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(session_id = %session_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.disconnect(&session_id).await;
}

/// Forwards queued events until the hub asks to close or the socket fails.
async fn pump_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
    session_id: SessionId,
) {
    while let Some(msg) = outbound.recv().await {
        match msg {
            Outbound::Event(event) => {
                let json = match event.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(
                            session_id = %session_id,
                            event = event.name(),
                            "Event serialization failed: {}",
                            e
                        );
                        continue;
                    }
                };
                if let Err(e) = sender.send(Message::Text(json)).await {
                    tracing::debug!(session_id = %session_id, "Send error, closing connection: {}", e);
                    break;
                }
            }
            Outbound::Close => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router(hub: Arc<SyncHub>, trust_forwarded_headers: bool) -> Router {
    let state = WebSocketState {
        hub,
        trust_forwarded_headers,
    };
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::InMemoryRecordStore;
    use crate::domain::savings::DEFAULT_SAVINGS_GOAL;

    #[test]
    fn websocket_router_creates_route() {
        let hub = Arc::new(SyncHub::new(
            Arc::new(InMemoryRecordStore::new()),
            DEFAULT_SAVINGS_GOAL,
            8,
        ));
        let _router = websocket_router(hub, false);
    }
}
