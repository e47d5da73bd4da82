//! Reconnector state machine

use super::backoff::Backoff;
use super::timer::Timer;
use crate::listeners::{Event, EventListeners, Listener};
use crate::options::{ConnectionOptions, Protocols};
use crate::telemetry::metrics;
use crate::ws::{BinaryType, Socket, Transport};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Owns the live socket and replaces it when it drops
///
/// Socket calls and listener callbacks never happen while the internal
/// state lock is held, so listeners may call back into the reconnector.
pub struct Reconnector<T: Transport> {
    shared: Arc<Shared<T>>,
}

struct Shared<T: Transport> {
    id: Uuid,
    url: String,
    protocols: Protocols,
    options: ConnectionOptions,
    transport: T,
    listeners: Arc<EventListeners>,
    /// Attached to the live socket's `close`; arms the retry timer
    close_hook: Listener,
    state: Mutex<State<T::Socket>>,
}

struct State<S> {
    socket: S,
    attempts: Option<u32>,
    backoff: Backoff,
    binary_type: BinaryType,
    /// Id of the socket opened by the latest retry
    attempt: u64,
    connect_timer: Option<Timer>,
    retry_timer: Option<Timer>,
    terminated: bool,
}

impl<T: Transport> Reconnector<T> {
    /// Open the first socket and start watching it
    pub fn new(
        transport: T,
        listeners: Arc<EventListeners>,
        url: impl Into<String>,
        protocols: impl Into<Protocols>,
        options: ConnectionOptions,
    ) -> Self {
        let url = url.into();
        let protocols = protocols.into();

        let shared = Arc::new_cyclic(|weak: &Weak<Shared<T>>| {
            let close_hook = {
                let weak = weak.clone();
                Listener::new(move |_| {
                    if let Some(shared) = weak.upgrade() {
                        shared.reconnect();
                    }
                })
            };

            let binary_type = BinaryType::default();
            let socket = transport.open(&url, &protocols);
            socket.set_binary_type(binary_type);

            Shared {
                id: Uuid::new_v4(),
                state: Mutex::new(State {
                    socket,
                    attempts: options.reconnect_attempts,
                    backoff: Backoff::from_duration(options.reconnect_delay),
                    binary_type,
                    attempt: 0,
                    connect_timer: None,
                    retry_timer: None,
                    terminated: false,
                }),
                url,
                protocols,
                options,
                transport,
                listeners,
                close_hook,
            }
        });

        if shared.options.reconnect {
            let socket = shared.state.lock().socket.clone();
            shared.attach_close_listener(&socket);
        }

        tracing::info!(
            id = %shared.id,
            url = %shared.url,
            reconnect = shared.options.reconnect,
            "Socket created"
        );

        Self { shared }
    }

    /// Identifier used in log events
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn protocols(&self) -> &Protocols {
        &self.shared.protocols
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.shared.options
    }

    /// Handle to the live socket
    pub fn socket(&self) -> T::Socket {
        self.shared.state.lock().socket.clone()
    }

    /// Remaining reconnection attempts (`None` = unbounded)
    pub fn attempts(&self) -> Option<u32> {
        self.shared.state.lock().attempts
    }

    /// Delay the next retry will wait for
    pub fn backoff(&self) -> Backoff {
        self.shared.state.lock().backoff
    }

    /// Whether the connection was closed for good
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().terminated
    }

    pub fn binary_type(&self) -> BinaryType {
        self.shared.state.lock().binary_type
    }

    /// Set the binary type of the live socket and of every future one
    pub fn set_binary_type(&self, binary_type: BinaryType) {
        let socket = {
            let mut state = self.shared.state.lock();
            state.binary_type = binary_type;
            state.socket.clone()
        };
        socket.set_binary_type(binary_type);
    }

    /// Close the connection and stop reconnecting
    pub fn close(&self, code: Option<u16>, reason: Option<&str>) {
        self.shared.close(code, reason);
    }
}

impl<T: Transport> Shared<T> {
    fn attach_close_listener(&self, socket: &T::Socket) {
        socket.add_event_listener(Event::CLOSE, self.close_hook.clone());
    }

    /// Open a fresh socket and make it the live one
    ///
    /// Returns the socket with its attempt id. The previous handle is dropped
    /// without being closed; only its pending `onopen` is cleared. An `open`
    /// already in flight from it carries a stale attempt id and is ignored.
    fn bootstrap(&self) -> (T::Socket, u64) {
        let binary_type = self.state.lock().binary_type;
        let socket = self.transport.open(&self.url, &self.protocols);
        socket.set_binary_type(binary_type);

        let (previous, attempt) = {
            let mut state = self.state.lock();
            state.attempt += 1;
            let previous = std::mem::replace(&mut state.socket, socket.clone());
            (previous, state.attempt)
        };
        previous.set_onopen(None);

        (socket, attempt)
    }

    /// Arm the retry timer for the current backoff
    fn reconnect(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if state.terminated {
            return;
        }

        let backoff = state.backoff;
        let weak = Arc::downgrade(self);
        let timer = Timer::arm(backoff.as_duration(), move |id| {
            if let Some(shared) = weak.upgrade() {
                shared.on_retry_timer(id);
            }
        });
        if let Some(previous) = state.retry_timer.replace(timer) {
            previous.cancel();
        }
        drop(state);

        tracing::debug!(
            id = %self.id,
            backoff_ms = backoff.as_millis_f64(),
            "Reconnect scheduled"
        );
    }

    fn on_retry_timer(self: &Arc<Self>, timer_id: u64) {
        {
            let mut state = self.state.lock();
            if state.retry_timer.as_ref().map(Timer::id) != Some(timer_id) {
                return;
            }
            state.retry_timer = None;
        }
        self.reconnect_unsuccessful();
    }

    /// The previous attempt did not open in time: spend an attempt or give up
    fn reconnect_unsuccessful(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if state.terminated {
            return;
        }

        if matches!(state.attempts, Some(remaining) if remaining < 1) {
            if let Some(timer) = state.retry_timer.take() {
                timer.cancel();
            }
            drop(state);

            tracing::warn!(id = %self.id, url = %self.url, "Reconnection attempts exhausted, closing");
            metrics::record_exhausted();
            self.close(None, None);
            return;
        }

        if let Some(remaining) = state.attempts.as_mut() {
            *remaining -= 1;
        }
        state.backoff = state.backoff.grow(self.options.reconnect_delay_exponent);
        let (attempts, backoff) = (state.attempts, state.backoff);
        drop(state);

        tracing::info!(
            id = %self.id,
            url = %self.url,
            attempts_remaining = ?attempts,
            backoff_ms = backoff.as_millis_f64(),
            "Reconnecting"
        );
        metrics::record_attempt();
        metrics::set_backoff(backoff.as_millis_f64());

        self.connect();
    }

    /// Start a new attempt and keep the retry loop running behind it
    fn connect(self: &Arc<Self>) {
        let (socket, attempt) = self.bootstrap();
        let weak = Arc::downgrade(self);
        socket.set_onopen(Some(Listener::new(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.reconnect_successful(attempt, event);
            }
        })));

        let weak = Arc::downgrade(self);
        let target = socket.clone();
        let timer = Timer::arm(self.options.connect_timeout, move |id| {
            if let Some(shared) = weak.upgrade() {
                shared.on_connect_timer(id, &target);
            }
        });
        if let Some(previous) = self.state.lock().connect_timer.replace(timer) {
            previous.cancel();
        }

        self.reconnect();
    }

    fn on_connect_timer(&self, timer_id: u64, socket: &T::Socket) {
        {
            let mut state = self.state.lock();
            if state.connect_timer.as_ref().map(Timer::id) != Some(timer_id) {
                return;
            }
            state.connect_timer = None;
        }

        tracing::debug!(id = %self.id, "Handshake timed out, closing attempt");
        socket.close(None, None);
    }

    fn reconnect_successful(&self, attempt: u64, event: &Event) {
        let socket = {
            let mut state = self.state.lock();
            if state.terminated {
                return;
            }
            if state.attempt != attempt {
                drop(state);
                tracing::debug!(id = %self.id, attempt, "Ignoring open from a discarded attempt");
                return;
            }
            if let Some(timer) = state.connect_timer.take() {
                timer.cancel();
            }
            if let Some(timer) = state.retry_timer.take() {
                timer.cancel();
            }
            state.attempts = self.options.reconnect_attempts;
            state.backoff = Backoff::from_duration(self.options.reconnect_delay);
            state.socket.clone()
        };

        socket.set_onopen(None);
        self.attach_close_listener(&socket);
        self.listeners.attach(&socket);
        self.listeners.publish(event);

        tracing::info!(id = %self.id, url = %self.url, "Reconnected");
        metrics::record_success();
        metrics::set_backoff(Backoff::from_duration(self.options.reconnect_delay).as_millis_f64());
    }

    fn close(&self, code: Option<u16>, reason: Option<&str>) {
        let socket = {
            let mut state = self.state.lock();
            state.terminated = true;
            if let Some(timer) = state.connect_timer.take() {
                timer.cancel();
            }
            if let Some(timer) = state.retry_timer.take() {
                timer.cancel();
            }
            state.socket.clone()
        };

        socket.remove_event_listener(Event::CLOSE, &self.close_hook);
        socket.set_onopen(None);
        socket.close(code, reason);

        tracing::info!(id = %self.id, url = %self.url, ?code, "Socket closed");
    }
}

impl<T: Transport> Drop for Shared<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let Some(timer) = state.connect_timer.take() {
            timer.cancel();
        }
        if let Some(timer) = state.retry_timer.take() {
            timer.cancel();
        }
        if !state.terminated {
            state.socket.close(None, None);
        }
    }
}
