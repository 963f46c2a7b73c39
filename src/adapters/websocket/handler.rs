//! WebSocket upgrade handler for chat connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Register an outbound queue for the new connection
//! 2. Send `Connected`, then let the hub announce the room list
//! 3. Forward queued frames to the client and dispatch client frames to the hub
//! 4. On close, unregister the queue and reconcile the registry

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::watch;

use crate::application::{ChatHub, HubError};
use crate::domain::foundation::{ConnectionId, ErrorCode, Timestamp};

use super::connections::WebSocketBroadcaster;
use super::messages::{ClientMessage, ServerMessage};

/// State required for WebSocket handling.
///
/// Extracted from the application state.
#[derive(Clone)]
pub struct WebSocketState {
    /// Operation surface of the relay.
    pub hub: ChatHub,

    /// Transport side of the same broadcaster the hub publishes through.
    pub broadcaster: Arc<WebSocketBroadcaster>,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(hub: ChatHub, broadcaster: Arc<WebSocketBroadcaster>) -> Self {
        Self { hub, broadcaster }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /chat`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection. A client frame that is already
/// being dispatched when the socket closes runs to completion before the
/// connection is reconciled.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();

    let connection_id = ConnectionId::new();
    let mut outbound = state.broadcaster.register(connection_id).await;

    let connected = ServerMessage::Connected {
        connection_id: connection_id.to_string(),
        timestamp: Timestamp::now().to_rfc3339(),
    };
    if let Err(e) = state.broadcaster.send_direct(&connection_id, &connected).await {
        tracing::debug!(connection_id = %connection_id, "Failed to queue connected message: {}", e);
    }

    if let Err(e) = state.hub.on_connect(connection_id).await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Room announcement on connect failed");
    }

    // Forward queued frames to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = sender.send(Message::Text(frame.to_string())).await {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Handle incoming messages from client
    let (close_tx, mut close_rx) = watch::channel(false);
    let hub = state.hub.clone();
    let broadcaster = state.broadcaster.clone();
    let mut recv_task = tokio::spawn(async move {
        loop {
            let next = tokio::select! {
                next = receiver.next() => next,
                _ = close_rx.changed() => break,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    handle_text(&hub, &broadcaster, connection_id, &text).await;
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Received unsupported binary message"
                    );
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    // Protocol-level keepalive, answered by axum
                }
                Some(Ok(Message::Close(_))) => {
                    tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                    break;
                }
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                    break;
                }
                None => break,
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            let _ = close_tx.send(true);
            let _ = (&mut recv_task).await;
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    state.broadcaster.unregister(&connection_id).await;
    if let Err(e) = state.hub.on_disconnect(connection_id).await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Disconnect notifications failed");
    }
}

/// Parse and dispatch one text frame, answering failures with an error frame.
async fn handle_text(
    hub: &ChatHub,
    broadcaster: &WebSocketBroadcaster,
    connection_id: ConnectionId,
    text: &str,
) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => match dispatch(hub, broadcaster, connection_id, message).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "Request failed");
                Some(ServerMessage::error(e.code(), e.to_string()))
            }
        },
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, "Malformed frame: {}", e);
            Some(ServerMessage::error(
                ErrorCode::MalformedFrame,
                format!("Malformed frame: {}", e),
            ))
        }
    };

    if let Some(reply) = reply {
        if let Err(e) = broadcaster.send_direct(&connection_id, &reply).await {
            tracing::debug!(connection_id = %connection_id, "Failed to queue error frame: {}", e);
        }
    }
}

async fn dispatch(
    hub: &ChatHub,
    broadcaster: &WebSocketBroadcaster,
    connection_id: ConnectionId,
    message: ClientMessage,
) -> Result<(), HubError> {
    match message {
        ClientMessage::CreateRoom { room_id } => {
            hub.create_room(connection_id, &room_id).await?;
        }
        ClientMessage::JoinRoom { room_id, username } => {
            hub.join_room(connection_id, &room_id, &username).await?;
        }
        ClientMessage::LeaveRoom { room_id, username } => {
            hub.leave_room(connection_id, &room_id, &username).await?;
        }
        ClientMessage::RequestRoomList => {
            hub.request_room_list(connection_id).await?;
        }
        ClientMessage::UserTyping { room_id, username } => {
            hub.user_typing(connection_id, &room_id, &username).await?;
        }
        ClientMessage::SendMessage {
            room_id,
            username,
            message,
        } => {
            hub.send_message(connection_id, &room_id, &username, &message)
                .await?;
        }
        ClientMessage::Ping => {
            let pong = ServerMessage::Pong {
                timestamp: Timestamp::now().to_rfc3339(),
            };
            broadcaster.send_direct(&connection_id, &pong).await?;
        }
    }
    Ok(())
}

/// Create axum router for the WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(websocket_router())
///     .with_state(ws_state);
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/chat", get(ws_handler))
}
