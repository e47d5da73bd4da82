//! Backoff delay arithmetic

use std::fmt;
use std::time::Duration;

/// Delay before the next reconnection attempt, in milliseconds
///
/// Grows by exponentiation, not multiplication: `next = current ** exponent`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Backoff(f64);

impl Backoff {
    pub fn from_millis(millis: f64) -> Self {
        Self(millis)
    }

    pub fn from_duration(delay: Duration) -> Self {
        Self(delay.as_nanos() as f64 / 1e6)
    }

    /// Backoff after one more unsuccessful attempt
    pub fn grow(self, exponent: f64) -> Self {
        Self(self.0.powf(exponent))
    }

    pub fn as_millis_f64(self) -> f64 {
        self.0
    }

    /// Timer delay, saturating at [`Duration::MAX`]
    pub fn as_duration(self) -> Duration {
        Duration::try_from_secs_f64(self.0 / 1000.0).unwrap_or(Duration::MAX)
    }
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
