//! Per-connection handler: decode actions, route them, pump events back.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. There is no authentication step by design — a connection is
//! identified by a fresh server-assigned [`PlayerId`], and durable
//! identity (when the client has one) rides along inside `CreateRoom` /
//! `JoinRoom` for stats attribution only.
//!
//! The outbound half is a separate pump task draining the player's event
//! channel, so a slow socket never blocks the room actor that produced
//! the events.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use duskhunt_persist::Persistence;
use duskhunt_protocol::{ClientAction, Codec, PlayerId, ServerEvent};
use duskhunt_room::{CreateRequest, RegistryError};

use crate::server::ServerState;
use crate::ws::WsStream;

/// Counter for assigning connection-scoped player ids.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<P: Persistence>(
    stream: WsStream,
    state: Arc<ServerState<P>>,
) {
    let conn_id = PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(player_id = %conn_id, "connection open");

    let (mut write, mut read) = stream.split();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Outbound pump: engine events -> JSON text frames.
    let codec = state.codec;
    let pump = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let Ok(bytes) = codec.encode(&event) else {
                tracing::error!("failed to encode server event");
                continue;
            };
            let text =
                String::from_utf8(bytes).expect("serde_json emits valid UTF-8");
            if write.send(Message::text(text)).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop: text/binary frames -> client actions.
    while let Some(message) = read.next().await {
        let payload = match message {
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(player_id = %conn_id, error = %e, "recv error");
                break;
            }
        };

        let action: ClientAction = match state.codec.decode(&payload) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(
                    player_id = %conn_id,
                    error = %e,
                    "undecodable client action, dropping"
                );
                continue;
            }
        };

        dispatch(&state, conn_id, &events_tx, action).await;
    }

    // Disconnects are ordinary inbound events: the owning room processes
    // the removal through its inbox like anything else.
    state.registry.lock().await.remove_connection(conn_id).await;
    pump.abort();
    tracing::debug!(player_id = %conn_id, "connection closed");
}

/// Routes one decoded action to the registry or the owning room.
async fn dispatch<P: Persistence>(
    state: &Arc<ServerState<P>>,
    conn_id: PlayerId,
    events_tx: &mpsc::UnboundedSender<ServerEvent>,
    action: ClientAction,
) {
    match action {
        ClientAction::CreateRoom { name, mode, user, is_private, password, scene } => {
            let request =
                CreateRequest { name, mode, user, is_private, password, scene };
            let result = {
                let mut registry = state.registry.lock().await;
                registry.find_or_create(conn_id, request, events_tx.clone()).await
            };
            match result {
                Ok(room) => {
                    let _ = events_tx.send(ServerEvent::RoomCreated { room });
                }
                Err(e) => send_room_error(events_tx, &e),
            }
        }

        ClientAction::JoinRoom { room, name, user, password } => {
            let result = {
                let mut registry = state.registry.lock().await;
                registry
                    .join(conn_id, &room, name, user, password, events_tx.clone())
                    .await
            };
            if let Err(e) = result {
                send_room_error(events_tx, &e);
            }
        }

        ClientAction::LeaveRoom => {
            state.registry.lock().await.remove_connection(conn_id).await;
        }

        // Everything else belongs to the player's current room.
        other => {
            let result =
                state.registry.lock().await.route(conn_id, other).await;
            if let Err(e) = result {
                // Actions without a room are dropped like any other
                // invalid input; only log them.
                tracing::debug!(
                    player_id = %conn_id,
                    error = %e,
                    "unroutable action dropped"
                );
            }
        }
    }
}

/// The user-facing rejection path: registry failures become `RoomError`
/// events with their display text as the reason.
fn send_room_error(
    events_tx: &mpsc::UnboundedSender<ServerEvent>,
    error: &RegistryError,
) {
    let _ = events_tx.send(ServerEvent::RoomError { reason: error.to_string() });
}
