//! Listener store that outlives individual sockets

use super::{Event, Listener};
use crate::ws::Socket;
use parking_lot::Mutex;
use std::sync::Arc;

/// Ordered map from event type to listeners
///
/// Event types keep the order of their first subscription and listeners the
/// order they were added in. A single registry is meant to be created at
/// startup and shared by every socket of the process.
#[derive(Debug, Default)]
pub struct EventListeners {
    store: Mutex<Vec<(String, Vec<Listener>)>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry ready to be shared between sockets
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Append `listener` to the list for `event_type`
    pub fn subscribe(&self, event_type: &str, listener: Listener) {
        let mut store = self.store.lock();
        match store.iter_mut().find(|(kind, _)| kind == event_type) {
            Some((_, listeners)) => listeners.push(listener),
            None => store.push((event_type.to_string(), vec![listener])),
        }
    }

    /// Remove the first registration of `listener` under `event_type`
    ///
    /// Unknown types and listeners are ignored. The type itself stays in the
    /// registry even when its list becomes empty.
    pub fn remove(&self, event_type: &str, listener: &Listener) {
        let mut store = self.store.lock();
        if let Some((_, listeners)) = store.iter_mut().find(|(kind, _)| kind == event_type) {
            if let Some(index) = listeners.iter().position(|l| l == listener) {
                listeners.remove(index);
            }
        }
    }

    /// Register every stored listener on `socket`, in registry order
    pub fn attach<S: Socket>(&self, socket: &S) {
        for (event_type, listener) in self.snapshot() {
            socket.add_event_listener(&event_type, listener);
        }
    }

    /// Invoke every listener for the event's type with `event`
    pub fn publish(&self, event: &Event) {
        let listeners = self.listeners(event.event_type()).unwrap_or_default();
        for listener in &listeners {
            listener.call(event);
        }
    }

    /// Listeners currently registered for `event_type`
    ///
    /// `None` when the type was never subscribed to.
    pub fn listeners(&self, event_type: &str) -> Option<Vec<Listener>> {
        self.store
            .lock()
            .iter()
            .find(|(kind, _)| kind == event_type)
            .map(|(_, listeners)| listeners.clone())
    }

    /// Event types in first-subscription order
    pub fn event_types(&self) -> Vec<String> {
        self.store
            .lock()
            .iter()
            .map(|(kind, _)| kind.clone())
            .collect()
    }

    /// Total number of registrations across all types
    pub fn len(&self) -> usize {
        self.store
            .lock()
            .iter()
            .map(|(_, listeners)| listeners.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registration
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    // Listeners are called outside the lock so they may touch the registry.
    fn snapshot(&self) -> Vec<(String, Listener)> {
        self.store
            .lock()
            .iter()
            .flat_map(|(kind, listeners)| {
                listeners
                    .iter()
                    .map(move |listener| (kind.clone(), listener.clone()))
            })
            .collect()
    }
}
