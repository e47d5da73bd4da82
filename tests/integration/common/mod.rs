//! Shared utilities for integration tests

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// A local WebSocket server
///
/// Every connection is greeted with `hello-N`, N counting from 1. The first
/// `drop_first` connections are then closed by the server with code 1000;
/// later ones echo text and binary frames. The first requested sub-protocol
/// is always accepted.
pub struct MockWsServer {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Start a server that echoes on every connection
    pub async fn start() -> Self {
        Self::start_dropping(0).await
    }

    /// Start a server that closes its first `drop_first` connections
    pub async fn start_dropping(drop_first: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let shutdown = Arc::new(Notify::new());

        let counter = connections.clone();
        let stop = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                                let stop = stop.clone();
                                tokio::spawn(async move {
                                    handle_connection(stream, n, n <= drop_first, stop).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = stop.notified() => break,
                }
            }
        });

        Self {
            addr,
            connections,
            shutdown,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn handle_connection(stream: TcpStream, n: usize, drop_after_greeting: bool, shutdown: Arc<Notify>) {
    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, select_protocol).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    if write.send(Message::Text(format!("hello-{}", n))).await.is_err() {
        return;
    }

    if drop_after_greeting {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "going away".into(),
        };
        let _ = write.send(Message::Close(Some(frame))).await;
        // Drain until the client answers the close
        while let Some(Ok(_)) = read.next().await {}
        return;
    }

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) if msg.is_text() || msg.is_binary() => {
                        if write.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(msg)) if msg.is_close() => {
                        let _ = write.close().await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            _ = shutdown.notified() => break,
        }
    }
}

fn select_protocol(request: &Request, mut response: Response) -> Result<Response, ErrorResponse> {
    let first = request
        .headers()
        .get("Sec-WebSocket-Protocol")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<HeaderValue>().ok());
    if let Some(protocol) = first {
        response
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", protocol);
    }
    Ok(response)
}

/// An address nothing listens on
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}

/// Poll `condition` until it holds; panics after five seconds
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
