//! One-shot cancellable timers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// A pending callback on the tokio clock
///
/// The id lets a callback check that it is still the armed timer of its
/// kind; a firing that raced with cancellation sees a different id and
/// does nothing.
#[derive(Debug)]
pub(crate) struct Timer {
    id: u64,
    handle: JoinHandle<()>,
}

impl Timer {
    /// Run `on_fire` with this timer's id after `delay`
    pub(crate) fn arm<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let id = NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(id);
        });
        Self { id, handle }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}
