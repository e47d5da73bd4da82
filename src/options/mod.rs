//! Connection options, sub-protocols and their validation

mod validate;

pub use validate::{validate_options, validate_url, ValidatedArgs, ValidationError, OPTION_NAMES};

use std::time::Duration;

/// Default handshake allowance in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 250;
/// Default base backoff in milliseconds
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;
/// Default backoff exponent
pub const DEFAULT_RECONNECT_DELAY_EXPONENT: f64 = 1.05;

/// Reconnection behaviour of a socket
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionOptions {
    /// Time allowed for a fresh handshake before the socket is force-closed
    pub connect_timeout: Duration,
    /// Whether a dropped connection is retried at all
    pub reconnect: bool,
    /// Retry budget (`None` = unbounded)
    pub reconnect_attempts: Option<u32>,
    /// Base backoff before the first retry
    pub reconnect_delay: Duration,
    /// Exponent applied to the backoff (in milliseconds) after each failed attempt
    pub reconnect_delay_exponent: f64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            reconnect: true,
            reconnect_attempts: None,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            reconnect_delay_exponent: DEFAULT_RECONNECT_DELAY_EXPONENT,
        }
    }
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handshake timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    /// Enable or disable reconnection
    pub fn reconnect(mut self, enabled: bool) -> Self {
        self.reconnect = enabled;
        self
    }

    /// Limit the number of reconnection attempts
    pub fn reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = Some(attempts);
        self
    }

    /// Retry forever
    pub fn unbounded_attempts(mut self) -> Self {
        self.reconnect_attempts = None;
        self
    }

    /// Set the base backoff
    pub fn reconnect_delay(mut self, d: Duration) -> Self {
        self.reconnect_delay = d;
        self
    }

    /// Set the backoff exponent
    pub fn reconnect_delay_exponent(mut self, exponent: f64) -> Self {
        self.reconnect_delay_exponent = exponent;
        self
    }
}

/// Sub-protocols requested during the handshake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Protocols(Vec<String>);

impl Protocols {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }

    /// Value for the `Sec-WebSocket-Protocol` request header
    pub fn header_value(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.join(", "))
        }
    }
}

impl From<&str> for Protocols {
    fn from(protocol: &str) -> Self {
        Self(vec![protocol.to_string()])
    }
}

impl From<String> for Protocols {
    fn from(protocol: String) -> Self {
        Self(vec![protocol])
    }
}

impl From<Vec<String>> for Protocols {
    fn from(protocols: Vec<String>) -> Self {
        Self(protocols)
    }
}

impl From<Vec<&str>> for Protocols {
    fn from(protocols: Vec<&str>) -> Self {
        Self(protocols.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Protocols {
    fn from(protocols: [&str; N]) -> Self {
        Self(protocols.iter().map(|p| p.to_string()).collect())
    }
}

impl From<Option<Protocols>> for Protocols {
    fn from(protocols: Option<Protocols>) -> Self {
        protocols.unwrap_or_default()
    }
}
