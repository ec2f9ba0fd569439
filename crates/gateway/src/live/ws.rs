//! WebSocket transport for live sessions.
//!
//! Flow:
//! 1. Client connects to `/api/live`
//! 2. A fresh [`LiveSession`] is created for the connection
//! 3. Reader task decodes text frames into the driver's inbound queue
//! 4. Writer task forwards driver replies to the socket and closes it after
//!    `session_ended`

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gg_domain::error::Error;

use super::connection::drive_session;
use super::protocol::{decode_frame, ServerMessage};
use super::session::{LiveSession, SessionPolicy};
use crate::api::provider_unavailable;
use crate::state::AppState;

/// GET /api/live — upgrade to WebSocket.
pub async fn live_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let Some(client) = state.llm.clone() else {
        return provider_unavailable();
    };
    let policy = SessionPolicy::from_config(&state.config);
    let queue = state.config.live.inbound_queue.max(1);

    ws.on_upgrade(move |socket| handle_socket(socket, LiveSession::new(client, policy), queue))
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Socket handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn handle_socket(socket: WebSocket, session: LiveSession, queue: usize) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let session_id = session.id().to_string();
    tracing::info!(session_id = %session_id, "live client connected");

    let (inbound_tx, inbound_rx) = mpsc::channel(queue);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(queue);
    let closed = CancellationToken::new();

    // Writer task: forwards replies to the WS sink.
    let writer_closed = closed.clone();
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let is_end = matches!(msg, ServerMessage::SessionEnded { .. });
            if send_ws_message(&mut ws_sink, &msg).await.is_err() {
                writer_closed.cancel();
                break;
            }
            if is_end {
                let _ = ws_sink.send(Message::Close(None)).await;
                break;
            }
        }
    });

    // Reader task: decodes frames in arrival order.
    let reader_closed = closed.clone();
    let reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_stream.next().await {
            let frame = match msg {
                Message::Text(text) => decode_frame(&text),
                Message::Binary(_) => Err(Error::Protocol(
                    "binary frames are not supported; send JSON text".into(),
                )),
                Message::Close(_) => break,
                // axum answers pings itself.
                Message::Ping(_) | Message::Pong(_) => continue,
            };
            if inbound_tx.send(frame).await.is_err() {
                break;
            }
        }
        reader_closed.cancel();
    });

    let teardown = drive_session(session, inbound_rx, outbound_tx, closed).await;

    // The driver dropped its sender, so the writer drains and exits.
    let _ = writer.await;
    reader.abort();
    tracing::info!(session_id = %session_id, reason = ?teardown.reason, "live client disconnected");
}

async fn send_ws_message(
    sink: &mut (impl SinkExt<Message> + Unpin),
    msg: &ServerMessage,
) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json)).await.map_err(|_| ())
}
