//! WebSocket handler for the realtime notification stream
//!
//! Clients connect with their bearer token and receive the events published
//! into their enterprise's room, each as one JSON text frame of the form
//! `{ "event": ..., "payload": ... }`.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use tokio::sync::broadcast;

use crate::middleware::CurrentUser;
use crate::realtime::{EventBroadcaster, RealtimeEvent};
use crate::AppState;

/// Upgrade to a WebSocket scoped to the caller's enterprise room
pub async fn realtime_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Response {
    let room = EventBroadcaster::room_for_enterprise(current_user.0.enterprise_id);
    let receiver = state.events.subscribe();

    ws.on_upgrade(move |socket| stream_events(socket, room, receiver))
}

async fn stream_events(
    mut socket: WebSocket,
    room: String,
    mut receiver: broadcast::Receiver<RealtimeEvent>,
) {
    loop {
        tokio::select! {
            event = receiver.recv() => {
                match event {
                    Ok(event) => {
                        if event.room != room {
                            continue;
                        }

                        let frame = serde_json::json!({
                            "event": event.event,
                            "payload": event.payload,
                        });
                        let text = match serde_json::to_string(&frame) {
                            Ok(text) => text,
                            Err(err) => {
                                tracing::warn!("Failed to encode realtime frame: {}", err);
                                continue;
                            }
                        };

                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Realtime subscriber lagged, dropped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            message = socket.recv() => {
                match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Clients only listen on this stream; drop anything they send
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
