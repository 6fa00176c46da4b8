#![allow(dead_code)]

pub mod fixtures;
pub mod gateway;
pub mod http;
pub mod lint_server;

use std::net::SocketAddr;

/// An address nothing listens on: the port is bound then released.
pub async fn unused_local_address() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind an ephemeral port");
    listener.local_addr().expect("Failed to read the local address")
}
