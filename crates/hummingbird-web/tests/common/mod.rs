#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hummingbird_core::{CoreResult, FrameSource, PasswordDigest, SharedFrameSource};
use hummingbird_web::config::ServerConfig;
use hummingbird_web::state::AppState;

pub const PASSWORD: &str = "open-sesame";
pub const SESSION_COOKIE: &str = "hummingbird_session";

/// A tiny JPEG-shaped payload (SOI, APP0 marker, EOI).
pub const FRAME: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0xFF, 0xD9,
];

/// Returns [`FRAME`] on every call and counts the calls.
pub struct StubCamera {
    pub calls: Arc<AtomicUsize>,
}

impl FrameSource for StubCamera {
    fn capture(&mut self) -> CoreResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FRAME.to_vec())
    }
}

pub fn config(require_login: bool) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = Ipv4Addr::LOCALHOST.into();
    config.port = 0;
    config.auth.require_login = require_login;
    config.auth.password_hash = PasswordDigest::sha512_of(PASSWORD).encoded();
    config.auth.session_secret = "integration-test-session-secret-0123456789".to_string();
    config.auth.failed_login_delay_ms = 50;
    config.camera.tick_interval_ms = 20;
    config.rate_limit.login_requests_per_minute = 0;
    config
}

pub fn state_with_counter(config: ServerConfig) -> (AppState, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let camera = SharedFrameSource::new(StubCamera {
        calls: Arc::clone(&calls),
    });
    (AppState::new(config, camera).unwrap(), calls)
}

pub fn state(config: ServerConfig) -> AppState {
    state_with_counter(config).0
}

/// Serves the app on an ephemeral localhost port.
pub async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, hummingbird_web::app(state)).await.unwrap();
    });
    addr
}

/// Like [`spawn_server`], but with peer addresses available to handlers, as
/// the per-IP login limiter requires.
pub async fn spawn_server_with_connect_info(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            hummingbird_web::app(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}
