//! Integration tests for reconnection against a live server

use crate::common::{closed_port_url, wait_for, MockWsServer};
use boomerang_socket::{
    BoomerangSocket, ConnectionOptions, Event, EventListeners, Message, Protocols, ReadyState,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fast_options() -> ConnectionOptions {
    ConnectionOptions::new()
        .connect_timeout(Duration::from_millis(1000))
        .reconnect_delay(Duration::from_millis(100))
        .reconnect_delay_exponent(1.0)
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let server = MockWsServer::start_dropping(1).await;
    let listeners = EventListeners::shared();
    let socket = BoomerangSocket::connect(
        &server.ws_url(),
        Protocols::none(),
        fast_options(),
        listeners.clone(),
    )
    .unwrap();

    let opens = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));
    {
        let opens = opens.clone();
        socket.set_onopen(move |_| {
            opens.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let received = received.clone();
        socket.set_onmessage(move |event| {
            if let Event::Message(message) = event {
                received.lock().push(message.clone());
            }
        });
    }

    wait_for(|| opens.load(Ordering::SeqCst) == 2).await;
    wait_for(|| received.lock().len() == 2).await;
    assert_eq!(
        *received.lock(),
        vec![Message::from("hello-1"), Message::from("hello-2")]
    );
    assert_eq!(server.connections(), 2);
    assert_eq!(socket.ready_state(), ReadyState::Open);

    // Counters are back at their configured values
    assert_eq!(socket.reconnector().attempts(), None);
    assert_eq!(
        socket.reconnector().backoff().as_duration(),
        Duration::from_millis(100)
    );

    // The new connection carries traffic both ways
    socket.send("again").unwrap();
    wait_for(|| received.lock().len() == 3).await;
    assert_eq!(received.lock()[2], Message::from("again"));

    socket.close(None, None);
}

#[tokio::test]
async fn test_reconnect_disabled_stays_closed() {
    let server = MockWsServer::start_dropping(1).await;
    let socket = BoomerangSocket::connect(
        &server.ws_url(),
        Protocols::none(),
        fast_options().reconnect(false),
        EventListeners::shared(),
    )
    .unwrap();

    let closes = Arc::new(AtomicUsize::new(0));
    {
        let closes = closes.clone();
        socket.set_onclose(move |_| {
            closes.fetch_add(1, Ordering::SeqCst);
        });
    }

    wait_for(|| closes.load(Ordering::SeqCst) == 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(server.connections(), 1);
    assert_eq!(socket.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn test_attempts_exhausted_against_closed_port() {
    let url = closed_port_url().await;
    let socket = BoomerangSocket::connect(
        &url,
        Protocols::none(),
        ConnectionOptions::new()
            .connect_timeout(Duration::from_millis(20))
            .reconnect_attempts(2)
            .reconnect_delay(Duration::from_millis(50))
            .reconnect_delay_exponent(1.0),
        EventListeners::shared(),
    )
    .unwrap();

    let opens = Arc::new(AtomicUsize::new(0));
    {
        let opens = opens.clone();
        socket.set_onopen(move |_| {
            opens.fetch_add(1, Ordering::SeqCst);
        });
    }

    wait_for(|| socket.reconnector().is_closed()).await;

    assert_eq!(socket.reconnector().attempts(), Some(0));
    assert_eq!(opens.load(Ordering::SeqCst), 0);
    assert_eq!(socket.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn test_explicit_close_during_backoff() {
    let server = MockWsServer::start_dropping(1).await;
    let socket = BoomerangSocket::connect(
        &server.ws_url(),
        Protocols::none(),
        ConnectionOptions::new()
            .reconnect_delay(Duration::from_millis(500))
            .reconnect_delay_exponent(1.0),
        EventListeners::shared(),
    )
    .unwrap();

    let closes = Arc::new(AtomicUsize::new(0));
    {
        let closes = closes.clone();
        socket.set_onclose(move |_| {
            closes.fetch_add(1, Ordering::SeqCst);
        });
    }

    // Server dropped us; the retry is pending
    wait_for(|| closes.load(Ordering::SeqCst) == 1).await;
    socket.close(Some(1000), None);

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(server.connections(), 1);
    assert!(socket.reconnector().is_closed());
}
