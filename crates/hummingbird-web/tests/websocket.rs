//! End-to-end tests of the camera WebSocket against a live server.

mod common;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use hummingbird_core::encode_frame;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::{config, spawn_server, state, state_with_counter, FRAME, SESSION_COOKIE};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, cookie: Option<&str>) -> Result<Client, tokio_tungstenite::tungstenite::Error> {
    let mut request = format!("ws://{addr}/websocket").into_client_request()?;
    if let Some(cookie) = cookie {
        request
            .headers_mut()
            .insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    }
    connect_async(request).await.map(|(ws, _)| ws)
}

/// Next text frame, failing the test after `wait`.
async fn next_text(ws: &mut Client, wait: Duration) -> String {
    loop {
        let msg = timeout(wait, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return text.as_str().to_string();
        }
    }
}

#[tokio::test]
async fn read_camera_streams_base64_frames() {
    let addr = spawn_server(state(config(false))).await;
    let mut ws = connect(addr, None).await.unwrap();

    ws.send(Message::text("read_camera")).await.unwrap();

    let expected = encode_frame(FRAME);
    assert_eq!(expected, "/9j/4AAQSkZJRgD/2Q==");
    for _ in 0..3 {
        assert_eq!(next_text(&mut ws, Duration::from_secs(2)).await, expected);
    }
}

#[tokio::test]
async fn unsupported_message_is_a_no_op() {
    let addr = spawn_server(state(config(false))).await;
    let mut ws = connect(addr, None).await.unwrap();

    ws.send(Message::text("READ_CAMERA")).await.unwrap();
    assert!(timeout(Duration::from_millis(200), ws.next()).await.is_err());

    // The connection is still usable.
    ws.send(Message::text("read_camera")).await.unwrap();
    assert_eq!(
        next_text(&mut ws, Duration::from_secs(2)).await,
        encode_frame(FRAME)
    );
}

#[tokio::test]
async fn upgrade_requires_session_when_login_required() {
    let state = state(config(true));
    let token = state.issuer.issue().unwrap();
    let addr = spawn_server(state).await;

    assert!(connect(addr, None).await.is_err());
    assert!(connect(addr, Some(&format!("{SESSION_COOKIE}=garbage"))).await.is_err());

    let mut ws = connect(addr, Some(&format!("{SESSION_COOKIE}={token}")))
        .await
        .unwrap();
    ws.send(Message::text("read_camera")).await.unwrap();
    assert_eq!(
        next_text(&mut ws, Duration::from_secs(2)).await,
        encode_frame(FRAME)
    );
}

#[tokio::test]
async fn duplicate_read_camera_does_not_double_capture_rate() {
    let (state, calls) = state_with_counter(config(false));
    let addr = spawn_server(state).await;
    let mut ws = connect(addr, None).await.unwrap();

    ws.send(Message::text("read_camera")).await.unwrap();
    ws.send(Message::text("read_camera")).await.unwrap();
    ws.send(Message::text("read_camera")).await.unwrap();

    let mut received = 0;
    let window = tokio::time::Instant::now() + Duration::from_millis(400);
    while tokio::time::Instant::now() < window {
        if timeout(Duration::from_millis(50), ws.next()).await.is_ok() {
            received += 1;
        }
    }

    // One 20 ms loop yields about 20 frames in 400 ms; three loops would
    // yield about 60.
    assert!(received <= 30, "received {received} frames");
    assert!(calls.load(Ordering::SeqCst) <= 32);
}

#[tokio::test]
async fn closing_the_socket_stops_capture() {
    let (state, calls) = state_with_counter(config(false));
    let addr = spawn_server(state).await;
    let mut ws = connect(addr, None).await.unwrap();

    ws.send(Message::text("read_camera")).await.unwrap();
    next_text(&mut ws, Duration::from_secs(2)).await;

    ws.close(None).await.unwrap();
    drop(ws);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let settled = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), settled);
}

#[tokio::test]
async fn server_shutdown_closes_streams() {
    let (state, calls) = state_with_counter(config(false));
    let shutdown = state.shutdown.clone();
    let addr = spawn_server(state).await;
    let mut ws = connect(addr, None).await.unwrap();

    ws.send(Message::text("read_camera")).await.unwrap();
    next_text(&mut ws, Duration::from_secs(2)).await;

    shutdown.cancel();

    // Drain until the server's close frame or end of stream.
    let closed = timeout(Duration::from_secs(2), async {
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(closed.is_ok());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), settled);
}
