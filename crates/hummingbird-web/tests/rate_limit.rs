//! The per-IP limit on `/login`, exercised against a live server.

mod common;

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use common::{config, spawn_server_with_connect_info, state};

/// Sends `GET path` on a fresh connection and returns the status code.
async fn status_of(addr: SocketAddr, path: &str) -> u16 {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    let status_line = response.lines().next().unwrap();
    status_line.split_whitespace().nth(1).unwrap().parse().unwrap()
}

#[tokio::test]
async fn login_is_limited_after_burst() {
    let mut config = config(true);
    config.rate_limit.login_requests_per_minute = 3;
    let addr = spawn_server_with_connect_info(state(config)).await;

    for _ in 0..3 {
        assert_eq!(status_of(addr, "/login").await, 200);
    }
    assert_eq!(status_of(addr, "/login").await, 429);
}

#[tokio::test]
async fn limit_applies_only_to_login() {
    let mut config = config(false);
    config.rate_limit.login_requests_per_minute = 1;
    let addr = spawn_server_with_connect_info(state(config)).await;

    assert_eq!(status_of(addr, "/login").await, 200);
    assert_eq!(status_of(addr, "/login").await, 429);
    for _ in 0..5 {
        assert_eq!(status_of(addr, "/").await, 200);
    }
}
