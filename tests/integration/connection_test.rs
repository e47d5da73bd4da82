//! Integration tests for a single live connection

use crate::common::{closed_port_url, wait_for, MockWsServer};
use boomerang_socket::{
    BoomerangSocket, ConnectionOptions, Event, EventListeners, Message, Protocols, ReadyState,
    SendError,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

fn collect_messages(socket: &BoomerangSocket) -> Arc<Mutex<Vec<Message>>> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    socket.set_onmessage(move |event| {
        if let Event::Message(message) = event {
            sink.lock().push(message.clone());
        }
    });
    received
}

#[tokio::test]
async fn test_open_and_echo() {
    let server = MockWsServer::start().await;
    let socket = BoomerangSocket::connect(
        &server.ws_url(),
        Protocols::none(),
        ConnectionOptions::default(),
        EventListeners::shared(),
    )
    .unwrap();

    assert_eq!(socket.ready_state(), ReadyState::Connecting);
    assert_eq!(socket.send("too early"), Err(SendError::InvalidState));

    let received = collect_messages(&socket);
    wait_for(|| socket.ready_state() == ReadyState::Open).await;

    socket.send("ping").unwrap();
    socket.send(vec![1u8, 2, 3]).unwrap();

    wait_for(|| received.lock().len() == 3).await;
    assert_eq!(
        *received.lock(),
        vec![
            Message::from("hello-1"),
            Message::from("ping"),
            Message::Binary(vec![1, 2, 3]),
        ]
    );
}

#[tokio::test]
async fn test_close_with_code_and_reason() {
    let server = MockWsServer::start().await;
    let socket = BoomerangSocket::connect(
        &server.ws_url(),
        Protocols::none(),
        ConnectionOptions::default(),
        EventListeners::shared(),
    )
    .unwrap();

    let closes = Arc::new(Mutex::new(Vec::new()));
    {
        let closes = closes.clone();
        socket.set_onclose(move |event| {
            if let Event::Close(close) = event {
                closes.lock().push(close.clone());
            }
        });
    }

    wait_for(|| socket.ready_state() == ReadyState::Open).await;
    socket.close(Some(1000), Some("bye"));

    wait_for(|| !closes.lock().is_empty()).await;
    let close = closes.lock()[0].clone();
    assert_eq!(close.code, 1000);
    assert!(close.was_clean);
    assert!(socket.reconnector().is_closed());
    assert_eq!(socket.ready_state(), ReadyState::Closed);

    // Terminal: no reconnection follows
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_failed_handshake_dispatches_error_then_close() {
    let url = closed_port_url().await;
    let socket = BoomerangSocket::connect(
        &url,
        Protocols::none(),
        ConnectionOptions::new().reconnect(false),
        EventListeners::shared(),
    )
    .unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    for event_type in [Event::ERROR, Event::CLOSE] {
        let events = events.clone();
        socket.add_event_listener(
            event_type,
            boomerang_socket::Listener::new(move |event| {
                events.lock().push(event.event_type());
            }),
        );
    }

    wait_for(|| events.lock().len() == 2).await;
    assert_eq!(*events.lock(), vec!["error", "close"]);
    assert_eq!(socket.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn test_negotiated_protocol() {
    let server = MockWsServer::start().await;
    let socket = BoomerangSocket::connect(
        &server.ws_url(),
        ["chat", "superchat"],
        ConnectionOptions::default(),
        EventListeners::shared(),
    )
    .unwrap();

    assert_eq!(socket.protocol(), "");
    wait_for(|| socket.ready_state() == ReadyState::Open).await;
    assert_eq!(socket.protocol(), "chat");
    assert_eq!(socket.url(), server.ws_url());
}
