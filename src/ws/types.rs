//! WebSocket types shared by every transport

use std::fmt;
use thiserror::Error;

/// Status code used when a connection dropped without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Status code for a normal, intentional close
pub const NORMAL_CLOSURE: u16 = 1000;

/// A data message travelling over the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Text message
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
}

impl Message {
    /// Payload length in bytes
    pub fn len(&self) -> usize {
        match self {
            Message::Text(text) => text.len(),
            Message::Binary(data) => data.len(),
        }
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text payload, if this is a text message
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            Message::Binary(_) => None,
        }
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Message::Binary(data)
    }
}

/// Payload of a `close` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    /// Close status code
    pub code: u16,
    /// Close reason sent by the peer (may be empty)
    pub reason: String,
    /// Whether the closing handshake completed
    pub was_clean: bool,
}

impl CloseEvent {
    /// A close that happened without a closing handshake
    pub fn abnormal() -> Self {
        Self {
            code: ABNORMAL_CLOSURE,
            reason: String::new(),
            was_clean: false,
        }
    }
}

/// Connection state of a single socket, numbered like the browser constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Connecting => "connecting",
            ReadyState::Open => "open",
            ReadyState::Closing => "closing",
            ReadyState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// How binary payloads are exposed to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryType {
    #[default]
    Blob,
    ArrayBuffer,
}

/// Errors returned by [`Socket::send`](super::Socket::send)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The handshake has not completed yet
    #[error("socket is still connecting")]
    InvalidState,
    /// The socket task is gone
    #[error("socket channel closed")]
    ChannelClosed,
}
