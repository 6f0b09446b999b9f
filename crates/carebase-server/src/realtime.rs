//! Realtime change feed over WebSocket.
//!
//! Each connection owns one [`Subscription`]. Events are forwarded as text
//! frames of the form `{"event": "resourceCreated", "data": {...}}`. Nothing is
//! replayed: a client only sees events published after it connected.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use carebase_api::ApiError;
use carebase_notifications::{ChangeNotifier, Subscription};
use futures_util::{SinkExt, StreamExt};

use crate::server::AppState;

/// Upgrade handler for the change feed route.
///
/// A plain HTTP request on this route gets a JSON 400 instead of axum's text
/// rejection.
pub async fn realtime_handler(
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(notifier) = state.notifier.clone() else {
        return ApiError::not_found("Realtime channel is disabled").into_response();
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            return ApiError::bad_request(format!(
                "Expected a WebSocket upgrade: {}",
                rejection.body_text()
            ))
            .into_response();
        }
    };

    // Register before the handshake completes so the client misses nothing
    // published after the upgrade response.
    let subscription = notifier.subscribe();
    ws.on_upgrade(move |socket| run_session(socket, notifier, subscription))
}

async fn run_session(socket: WebSocket, notifier: Arc<ChangeNotifier>, mut subscription: Subscription) {
    let id = subscription.id();
    let (mut ws_write, mut ws_read) = socket.split();

    tracing::info!(subscription.id = %id, "client connected");

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    tracing::debug!(subscription.id = %id, "Change feed closed");
                    let _ = ws_write.send(Message::Close(None)).await;
                    break;
                };
                let frame = event.to_wire().to_string();
                if let Err(e) = ws_write.send(Message::Text(frame.into())).await {
                    tracing::debug!(subscription.id = %id, error = %e, "Realtime write error");
                    break;
                }
            }
            incoming = ws_read.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if ws_write.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(subscription.id = %id, error = %e, "Realtime read error");
                        break;
                    }
                    // Clients have nothing to say on this channel.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    notifier.unsubscribe(id);
    tracing::info!(subscription.id = %id, "client disconnected");
}
