//! WebSocket transport layer
//!
//! A [`Transport`] creates [`Socket`]s. A socket behaves like a browser
//! WebSocket: it connects in the background, dispatches `open`, `message`,
//! `error` and `close` events to its listeners and never reconnects on its
//! own. Reconnection is layered on top by the
//! [`Reconnector`](crate::reconnector::Reconnector).

mod client;
mod types;

pub use client::{WsSocket, WsTransport};
pub use types::{
    BinaryType, CloseEvent, Message, ReadyState, SendError, ABNORMAL_CLOSURE, NORMAL_CLOSURE,
};

use crate::listeners::Listener;
use crate::options::Protocols;

/// Factory for underlying sockets
pub trait Transport: Send + Sync + 'static {
    type Socket: Socket;

    /// Create a socket and start its handshake
    fn open(&self, url: &str, protocols: &Protocols) -> Self::Socket;
}

/// A single, non-reconnecting WebSocket connection
///
/// Handles are cheap to clone and all clones refer to the same connection.
pub trait Socket: Clone + Send + Sync + 'static {
    /// Register a listener for `event_type`
    fn add_event_listener(&self, event_type: &str, listener: Listener);

    /// Remove the first listener for `event_type` that is the same callback
    fn remove_event_listener(&self, event_type: &str, listener: &Listener);

    /// Set or clear the `onopen` handler
    fn set_onopen(&self, handler: Option<Listener>);

    fn set_binary_type(&self, binary_type: BinaryType);

    fn binary_type(&self) -> BinaryType;

    /// Queue a message for sending
    fn send(&self, message: Message) -> Result<(), SendError>;

    /// Start the closing handshake
    fn close(&self, code: Option<u16>, reason: Option<&str>);

    fn ready_state(&self) -> ReadyState;

    /// Bytes queued by `send` but not yet written
    fn buffered_amount(&self) -> usize;

    /// Extensions selected by the server
    fn extensions(&self) -> String;

    /// Sub-protocol selected by the server
    fn protocol(&self) -> String;

    fn url(&self) -> String;
}
