//! Leading + trailing throttle.
//!
//! The first call outside a cooldown window runs the handler at once and
//! opens a window. Calls inside the window collapse into a single trailing
//! call that runs as soon as the window closes and opens a new one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::Duration;
use parking_lot::Mutex;

use super::event_loop::{EventLoop, TimerId};

type Handler = dyn Fn() + Send + Sync;

#[derive(Debug, Default)]
struct ThrottleState {
    window: Option<TimerId>,
    trailing: bool,
}

struct ThrottleInner {
    handler: Arc<Handler>,
    event_loop: Arc<EventLoop>,
    cooldown: Duration,
    state: Mutex<ThrottleState>,
    invocations: AtomicU64,
}

/// Rate limiter wrapping a handler.
#[derive(Clone)]
pub struct Throttle {
    inner: Arc<ThrottleInner>,
}

impl Throttle {
    /// Wraps `handler` with a cooldown window of `cooldown`.
    pub fn new(
        event_loop: Arc<EventLoop>,
        cooldown: Duration,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(ThrottleInner {
                handler: Arc::new(handler),
                event_loop,
                cooldown,
                state: Mutex::new(ThrottleState::default()),
                invocations: AtomicU64::new(0),
            }),
        }
    }

    /// Requests a handler invocation.
    pub fn call(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.window.is_some() {
                state.trailing = true;
                tracing::trace!("throttle cooling down, trailing call pending");
                return;
            }
            state.window = Some(open_window(&self.inner));
        }
        invoke(&self.inner);
    }

    /// Returns true while a cooldown window is open.
    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        self.inner.state.lock().window.is_some()
    }

    /// Returns true if a trailing call is waiting for the window to close.
    #[must_use]
    pub fn has_trailing(&self) -> bool {
        self.inner.state.lock().trailing
    }

    /// Drops any pending trailing call and closes the current window.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.trailing = false;
        if let Some(id) = state.window.take() {
            self.inner.event_loop.cancel(id);
        }
    }

    /// How many times the handler has run.
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.inner.invocations.load(Ordering::Relaxed)
    }

    /// Length of the cooldown window.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.inner.cooldown
    }
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("cooldown_ms", &self.inner.cooldown.num_milliseconds())
            .field("invocations", &self.invocations())
            .finish_non_exhaustive()
    }
}

fn open_window(inner: &Arc<ThrottleInner>) -> TimerId {
    let weak: Weak<ThrottleInner> = Arc::downgrade(inner);
    inner.event_loop.schedule_after(inner.cooldown, move || {
        if let Some(inner) = weak.upgrade() {
            close_window(&inner);
        }
    })
}

fn close_window(inner: &Arc<ThrottleInner>) {
    {
        let mut state = inner.state.lock();
        state.window = None;
        if !state.trailing {
            return;
        }
        state.trailing = false;
        state.window = Some(open_window(inner));
    }
    tracing::trace!("throttle window closed, running trailing call");
    invoke(inner);
}

// Runs the handler with no lock held so it may call back into the throttle.
fn invoke(inner: &ThrottleInner) {
    inner.invocations.fetch_add(1, Ordering::Relaxed);
    (inner.handler)();
}
