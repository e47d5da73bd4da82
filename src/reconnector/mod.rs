//! Reconnection state machine
//!
//! A [`Reconnector`] owns the live socket. When that socket closes it waits
//! for the current backoff, then opens a replacement. Every failed attempt
//! spends one unit of the attempt budget and raises the backoff to the
//! configured exponent. A successful open resets both, moves the caller's
//! listeners onto the new socket and re-publishes `open`. Once the budget is
//! spent the connection is closed for good.

mod backoff;
mod machine;
mod timer;

pub use backoff::Backoff;
pub use machine::Reconnector;
