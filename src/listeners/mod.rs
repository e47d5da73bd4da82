//! Event listener registry
//!
//! Listeners added through a [`BoomerangSocket`](crate::BoomerangSocket) are
//! recorded here as well as on the live socket, so they can be replayed onto
//! every replacement socket after a reconnection.

mod registry;
mod types;

pub use registry::EventListeners;
pub use types::{Event, Listener};
