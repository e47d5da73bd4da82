//! boomerang-socket: a WebSocket client that reconnects on its own
//!
//! This library provides:
//! - A browser-like socket abstraction over tokio-tungstenite
//! - A shared registry of event listeners replayed onto every new connection
//! - A reconnection state machine with exponential backoff and a retry budget
//! - Validation of untyped connection arguments
//! - Logging and metrics setup

pub mod cli;
pub mod config;
pub mod listeners;
pub mod options;
pub mod reconnector;
pub mod socket;
pub mod telemetry;
pub mod ws;

pub use listeners::{Event, EventListeners, Listener};
pub use options::{ConnectionOptions, Protocols, ValidationError};
pub use socket::BoomerangSocket;
pub use ws::{BinaryType, CloseEvent, Message, ReadyState, SendError};
