//! WebSocket ping endpoint
//!
//! Every inbound text message is answered with a fresh [`PingResponse`]
//! frame, so any client message works as a probe. Malformed JSON ends the
//! session.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, error, info};

use crate::api::AppState;
use crate::models::{PingResponse, ProbeRequest};

/// Handle WebSocket upgrade request
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket client connected");

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if serde_json::from_str::<serde_json::Value>(&text).is_err() {
                    error!("Malformed client frame, closing connection");
                    break;
                }

                if serde_json::from_str::<ProbeRequest>(&text).is_ok() {
                    debug!("Probe received");
                }

                // Any well-formed message is acknowledged with a ping payload
                let reply = PingResponse::now(state.started_at);
                if let Ok(json) = serde_json::to_string(&reply) {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                if sender.send(Message::Pong(payload)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket client disconnected");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    debug!("WebSocket connection closed");
}
