/// Real-time event stream
///
/// Every event published on the application broadcaster is forwarded to each
/// connected client as a JSON text frame `{"event": ..., "data": ...}`.
/// Client messages are ignored apart from close.
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    logger::{self, LogTag},
    webserver::state::AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    state.increment_ws_connections();
    logger::debug(
        LogTag::Webserver,
        &format!(
            "WebSocket connection opened (active_ws={})",
            state.ws_connection_count()
        ),
    );

    let (mut sender, mut receiver) = socket.split();
    let mut events = state.broadcaster.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let frame = match event.to_frame() {
                        Ok(frame) => frame,
                        Err(e) => {
                            logger::error(
                                LogTag::Webserver,
                                &format!("Failed to serialize {}: {}", event.name(), e),
                            );
                            continue;
                        }
                    };
                    if sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    logger::warning(
                        LogTag::Webserver,
                        &format!("WebSocket client lagging, skipped {} events", skipped),
                    );
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    logger::debug(LogTag::Webserver, &format!("WebSocket receive error: {}", e));
                    break;
                }
            },
        }
    }

    state.decrement_ws_connections();
    logger::debug(
        LogTag::Webserver,
        &format!(
            "WebSocket connection closed (active_ws={})",
            state.ws_connection_count()
        ),
    );
}
