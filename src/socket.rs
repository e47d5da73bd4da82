//! Public WebSocket facade
//!
//! [`BoomerangSocket`] looks like a plain WebSocket but survives
//! connection drops. Listeners added here are stored in the shared
//! [`EventListeners`] registry as well as on the live socket, so they follow
//! the connection across reconnections.

use crate::listeners::{Event, EventListeners, Listener};
use crate::options::{
    validate_options, validate_url, ConnectionOptions, Protocols, ValidatedArgs, ValidationError,
};
use crate::reconnector::Reconnector;
use crate::ws::{BinaryType, Message, ReadyState, SendError, Socket, Transport, WsTransport};
use serde_json::Value;
use std::sync::Arc;

/// A WebSocket that reconnects on its own
pub struct BoomerangSocket<T: Transport = WsTransport> {
    reconnector: Reconnector<T>,
    listeners: Arc<EventListeners>,
}

impl BoomerangSocket<WsTransport> {
    /// Validate the arguments and start connecting
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(
        url: &str,
        protocols: impl Into<Protocols>,
        options: ConnectionOptions,
        listeners: Arc<EventListeners>,
    ) -> Result<Self, ValidationError> {
        Self::with_transport(WsTransport::new(), url, protocols, options, listeners)
    }

    /// Validate untyped arguments (e.g. from a config file) and start connecting
    pub fn connect_values(
        url: &Value,
        protocols: Option<&Value>,
        options: Option<&Value>,
        listeners: Arc<EventListeners>,
    ) -> Result<Self, ValidationError> {
        let ValidatedArgs {
            url,
            protocols,
            options,
        } = validate_options(url, protocols, options)?;
        Self::connect(&url, protocols, options, listeners)
    }
}

impl<T: Transport> BoomerangSocket<T> {
    /// Validate the arguments and start connecting through `transport`
    pub fn with_transport(
        transport: T,
        url: &str,
        protocols: impl Into<Protocols>,
        options: ConnectionOptions,
        listeners: Arc<EventListeners>,
    ) -> Result<Self, ValidationError> {
        validate_url(url)?;
        options.validate()?;

        let reconnector = Reconnector::new(transport, listeners.clone(), url, protocols, options);

        Ok(Self {
            reconnector,
            listeners,
        })
    }

    /// Add a listener that survives reconnections
    pub fn add_event_listener(&self, event_type: &str, listener: Listener) {
        self.listeners.subscribe(event_type, listener.clone());
        self.reconnector.socket().add_event_listener(event_type, listener);
    }

    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) {
        self.listeners.remove(event_type, listener);
        self.reconnector
            .socket()
            .remove_event_listener(event_type, listener);
    }

    /// Add a `close` listener; returns it for later removal
    pub fn set_onclose<F>(&self, f: F) -> Listener
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.add_handler(Event::CLOSE, f)
    }

    /// Add an `error` listener; returns it for later removal
    pub fn set_onerror<F>(&self, f: F) -> Listener
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.add_handler(Event::ERROR, f)
    }

    /// Add a `message` listener; returns it for later removal
    pub fn set_onmessage<F>(&self, f: F) -> Listener
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.add_handler(Event::MESSAGE, f)
    }

    /// Add an `open` listener; returns it for later removal
    ///
    /// It also runs after every successful reconnection.
    pub fn set_onopen<F>(&self, f: F) -> Listener
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.add_handler(Event::OPEN, f)
    }

    fn add_handler<F>(&self, event_type: &str, f: F) -> Listener
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let listener = Listener::new(f);
        self.add_event_listener(event_type, listener.clone());
        listener
    }

    pub fn buffered_amount(&self) -> usize {
        self.reconnector.socket().buffered_amount()
    }

    pub fn extensions(&self) -> String {
        self.reconnector.socket().extensions()
    }

    pub fn protocol(&self) -> String {
        self.reconnector.socket().protocol()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.reconnector.socket().ready_state()
    }

    pub fn url(&self) -> &str {
        self.reconnector.url()
    }

    pub fn binary_type(&self) -> BinaryType {
        self.reconnector.binary_type()
    }

    pub fn set_binary_type(&self, binary_type: BinaryType) {
        self.reconnector.set_binary_type(binary_type);
    }

    /// Send on the live socket
    ///
    /// Nothing is queued across reconnections: data sent while the
    /// connection is down is lost.
    pub fn send(&self, data: impl Into<Message>) -> Result<(), SendError> {
        self.reconnector.socket().send(data.into())
    }

    /// Close the connection and stop reconnecting
    pub fn close(&self, code: Option<u16>, reason: Option<&str>) {
        self.reconnector.close(code, reason);
    }

    /// The state machine behind this socket
    pub fn reconnector(&self) -> &Reconnector<T> {
        &self.reconnector
    }
}
