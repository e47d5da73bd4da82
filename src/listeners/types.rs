//! Event and listener types

use crate::ws::{CloseEvent, Message};
use std::fmt;
use std::sync::Arc;

/// An event dispatched by a socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The connection is open
    Open,
    /// A data message arrived
    Message(Message),
    /// The connection failed
    Error(String),
    /// The connection is closed
    Close(CloseEvent),
}

impl Event {
    pub const OPEN: &'static str = "open";
    pub const MESSAGE: &'static str = "message";
    pub const ERROR: &'static str = "error";
    pub const CLOSE: &'static str = "close";

    /// Event type string used for listener lookup
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Open => Self::OPEN,
            Event::Message(_) => Self::MESSAGE,
            Event::Error(_) => Self::ERROR,
            Event::Close(_) => Self::CLOSE,
        }
    }
}

/// A shared event callback
///
/// Two listeners are equal only when they are clones of the same callback.
/// Keep a clone around to remove the listener later.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(&Event) + Send + Sync>);

impl Listener {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the callback
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.0))
    }
}
