use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use hummingbird_core::Connection;
use tokio::sync::mpsc;

use crate::auth::middleware::SocketSession;
use crate::state::AppState;

/// `GET /websocket`. The session is checked here, once, before upgrading;
/// messages on the open socket are not re-authenticated.
pub async fn camera_handler(
    _session: SocketSession,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_camera(socket, state))
}

async fn handle_camera(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Capacity 1: a frame is only captured once the previous one has been
    // handed to the socket.
    let (frame_tx, mut frame_rx) = mpsc::channel::<String>(1);
    let mut connection = Connection::new(
        state.camera.clone(),
        frame_tx,
        state.config.camera.tick_interval(),
    );
    let conn_id = connection.id();
    tracing::info!(conn_id = %conn_id, "Camera client connected");

    loop {
        tokio::select! {
            frame = frame_rx.recv() => {
                match frame {
                    Some(payload) => {
                        if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                            tracing::debug!(conn_id = %conn_id, "Push failed, client gone");
                            break;
                        }
                    }
                    None => break,
                }
            }
            ws_msg = ws_receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        connection.handle_text(text.as_str());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::warn!(conn_id = %conn_id, "Unsupported binary message ({} bytes)", data.len());
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(conn_id = %conn_id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
            _ = state.shutdown.cancelled() => {
                let _ = ws_sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    // Cleanup: cancel the stream before the channel receiver goes away
    if let Some(stream) = connection.close() {
        let reason = stream.stopped().await;
        tracing::debug!(conn_id = %conn_id, ?reason, "Camera stream ended");
    }
    drop(frame_rx);
    tracing::info!(conn_id = %conn_id, "Camera client disconnected");
}
