//! tokio-tungstenite backed socket

use super::types::{BinaryType, CloseEvent, Message, ReadyState, SendError, ABNORMAL_CLOSURE};
use super::{Socket, Transport};
use crate::listeners::{Event, Listener};
use crate::options::Protocols;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::{Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite};

/// Creates [`WsSocket`]s on the current tokio runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WsTransport {
    type Socket = WsSocket;

    fn open(&self, url: &str, protocols: &Protocols) -> WsSocket {
        WsSocket::open(url, protocols)
    }
}

enum Command {
    Send(Message),
    Close {
        code: Option<u16>,
        reason: Option<String>,
    },
}

#[derive(Default)]
struct Handlers {
    listeners: Vec<(String, Listener)>,
    onopen: Option<Listener>,
}

struct Inner {
    url: String,
    ready_state: AtomicU8,
    buffered: AtomicUsize,
    binary_type: Mutex<BinaryType>,
    extensions: Mutex<String>,
    protocol: Mutex<String>,
    handlers: Mutex<Handlers>,
}

/// A single WebSocket connection driven by a background task
///
/// Must be opened from within a tokio runtime. Dropping the last handle
/// closes the connection.
#[derive(Clone)]
pub struct WsSocket {
    inner: Arc<Inner>,
    commands: mpsc::UnboundedSender<Command>,
}

impl WsSocket {
    /// Start connecting to `url` in the background
    pub fn open(url: &str, protocols: &Protocols) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            url: url.to_string(),
            ready_state: AtomicU8::new(ReadyState::Connecting as u8),
            buffered: AtomicUsize::new(0),
            binary_type: Mutex::new(BinaryType::default()),
            extensions: Mutex::new(String::new()),
            protocol: Mutex::new(String::new()),
            handlers: Mutex::new(Handlers::default()),
        });

        let task = inner.clone();
        let protocols = protocols.clone();
        tokio::spawn(async move {
            task.run(protocols, rx).await;
        });

        Self { inner, commands: tx }
    }
}

impl Socket for WsSocket {
    fn add_event_listener(&self, event_type: &str, listener: Listener) {
        self.inner
            .handlers
            .lock()
            .listeners
            .push((event_type.to_string(), listener));
    }

    fn remove_event_listener(&self, event_type: &str, listener: &Listener) {
        let mut handlers = self.inner.handlers.lock();
        if let Some(index) = handlers
            .listeners
            .iter()
            .position(|(kind, l)| kind == event_type && l == listener)
        {
            handlers.listeners.remove(index);
        }
    }

    fn set_onopen(&self, handler: Option<Listener>) {
        self.inner.handlers.lock().onopen = handler;
    }

    fn set_binary_type(&self, binary_type: BinaryType) {
        *self.inner.binary_type.lock() = binary_type;
    }

    fn binary_type(&self) -> BinaryType {
        *self.inner.binary_type.lock()
    }

    fn send(&self, message: Message) -> Result<(), SendError> {
        match self.inner.ready_state() {
            ReadyState::Connecting => Err(SendError::InvalidState),
            ReadyState::Open => {
                let len = message.len();
                self.inner.buffered.fetch_add(len, Ordering::SeqCst);
                self.commands
                    .send(Command::Send(message))
                    .map_err(|_| {
                        self.inner.buffered.fetch_sub(len, Ordering::SeqCst);
                        SendError::ChannelClosed
                    })
            }
            ReadyState::Closing | ReadyState::Closed => {
                tracing::debug!(url = %self.inner.url, "Dropping message sent after close");
                Ok(())
            }
        }
    }

    fn close(&self, code: Option<u16>, reason: Option<&str>) {
        let state = self.inner.ready_state();
        if matches!(state, ReadyState::Closing | ReadyState::Closed) {
            return;
        }
        self.inner.set_ready_state(ReadyState::Closing);
        let _ = self.commands.send(Command::Close {
            code,
            reason: reason.map(str::to_string),
        });
    }

    fn ready_state(&self) -> ReadyState {
        self.inner.ready_state()
    }

    fn buffered_amount(&self) -> usize {
        self.inner.buffered.load(Ordering::SeqCst)
    }

    fn extensions(&self) -> String {
        self.inner.extensions.lock().clone()
    }

    fn protocol(&self) -> String {
        self.inner.protocol.lock().clone()
    }

    fn url(&self) -> String {
        self.inner.url.clone()
    }
}

impl Inner {
    fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.ready_state.load(Ordering::SeqCst))
    }

    fn set_ready_state(&self, state: ReadyState) {
        self.ready_state.store(state as u8, Ordering::SeqCst);
    }

    /// Call `onopen` (for `open`) and every listener of the event's type
    fn dispatch(&self, event: &Event) {
        let handlers: Vec<Listener> = {
            let handlers = self.handlers.lock();
            let onopen = match event {
                Event::Open => handlers.onopen.clone(),
                _ => None,
            };
            onopen
                .into_iter()
                .chain(
                    handlers
                        .listeners
                        .iter()
                        .filter(|(kind, _)| kind == event.event_type())
                        .map(|(_, listener)| listener.clone()),
                )
                .collect()
        };
        for handler in &handlers {
            handler.call(event);
        }
    }

    /// Dispatch `error` then `close` for a connection that died
    fn fail(&self, error: String) {
        tracing::warn!(url = %self.url, error = %error, "WebSocket connection failed");
        self.set_ready_state(ReadyState::Closed);
        self.dispatch(&Event::Error(error));
        self.dispatch(&Event::Close(CloseEvent::abnormal()));
    }

    fn finish(&self, event: CloseEvent) {
        tracing::debug!(url = %self.url, code = event.code, clean = event.was_clean, "WebSocket closed");
        self.set_ready_state(ReadyState::Closed);
        self.dispatch(&Event::Close(event));
    }

    async fn run(self: Arc<Self>, protocols: Protocols, mut commands: mpsc::UnboundedReceiver<Command>) {
        let request = match build_request(&self.url, &protocols) {
            Ok(request) => request,
            Err(e) => {
                self.fail(e.to_string());
                return;
            }
        };

        tracing::info!(url = %self.url, "Connecting to WebSocket");

        let (ws_stream, response) = tokio::select! {
            result = connect_async(request) => match result {
                Ok(connected) => connected,
                Err(e) => {
                    self.fail(e.to_string());
                    return;
                }
            },
            _ = wait_for_close(&mut commands) => {
                self.fail("closed before the connection was established".into());
                return;
            }
        };

        self.record_handshake(&response);
        self.set_ready_state(ReadyState::Open);
        tracing::info!(url = %self.url, "WebSocket connected");
        self.dispatch(&Event::Open);

        let (mut write, mut read) = ws_stream.split();
        let mut received_close: Option<CloseEvent> = None;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            self.dispatch(&Event::Message(Message::Text(text)));
                        }
                        Some(Ok(tungstenite::Message::Binary(data))) => {
                            self.dispatch(&Event::Message(Message::Binary(data)));
                        }
                        Some(Ok(tungstenite::Message::Close(frame))) => {
                            tracing::info!(url = %self.url, "Received close frame");
                            self.set_ready_state(ReadyState::Closing);
                            received_close = Some(match frame {
                                Some(frame) => CloseEvent {
                                    code: u16::from(frame.code),
                                    reason: frame.reason.into_owned(),
                                    was_clean: true,
                                },
                                None => CloseEvent {
                                    code: 1005,
                                    reason: String::new(),
                                    was_clean: true,
                                },
                            });
                        }
                        Some(Ok(_)) => {
                            // Ping/pong replies are handled by tungstenite
                        }
                        Some(Err(tungstenite::Error::ConnectionClosed)) | None => {
                            self.finish(received_close.unwrap_or_else(CloseEvent::abnormal));
                            return;
                        }
                        Some(Err(e)) => {
                            if let Some(event) = received_close.take() {
                                self.finish(event);
                            } else {
                                self.fail(e.to_string());
                            }
                            return;
                        }
                    }
                }

                cmd = commands.recv() => {
                    match cmd {
                        Some(Command::Send(message)) => {
                            let len = message.len();
                            let result = write.send(into_frame(message)).await;
                            self.buffered.fetch_sub(len, Ordering::SeqCst);
                            if let Err(e) = result {
                                self.fail(e.to_string());
                                return;
                            }
                        }
                        Some(Command::Close { code, reason }) => {
                            let frame = code.map(|code| CloseFrame {
                                code: CloseCode::from(code),
                                reason: Cow::Owned(reason.unwrap_or_default()),
                            });
                            if let Err(e) = write.send(tungstenite::Message::Close(frame)).await {
                                tracing::debug!(url = %self.url, error = %e, "Close frame not sent");
                                self.finish(CloseEvent {
                                    code: code.unwrap_or(ABNORMAL_CLOSURE),
                                    reason: String::new(),
                                    was_clean: false,
                                });
                                return;
                            }
                        }
                        None => {
                            tracing::debug!(url = %self.url, "Last handle dropped, closing");
                            let _ = write.send(tungstenite::Message::Close(None)).await;
                            self.finish(CloseEvent::abnormal());
                            return;
                        }
                    }
                }
            }
        }
    }

    fn record_handshake(&self, response: &Response) {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        *self.extensions.lock() = header("sec-websocket-extensions");
        *self.protocol.lock() = header("sec-websocket-protocol");
    }
}

fn build_request(url: &str, protocols: &Protocols) -> Result<Request, tungstenite::Error> {
    let mut request = url.into_client_request()?;
    if let Some(value) = protocols.header_value() {
        let value = HeaderValue::from_str(&value)
            .map_err(|e| tungstenite::Error::HttpFormat(e.into()))?;
        request.headers_mut().insert("Sec-WebSocket-Protocol", value);
    }
    Ok(request)
}

fn into_frame(message: Message) -> tungstenite::Message {
    match message {
        Message::Text(text) => tungstenite::Message::Text(text),
        Message::Binary(data) => tungstenite::Message::Binary(data),
    }
}

/// Resolves once a close is requested or every handle is gone
async fn wait_for_close(commands: &mut mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.recv().await {
        if let Command::Close { .. } = command {
            return;
        }
    }
}
