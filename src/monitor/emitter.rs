//! Publish/subscribe for breakpoint events.
//!
//! [`EventBus`] is the seam: hosts may bring their own bus, and
//! [`EventEmitter`] is the in-process default. Emission takes a snapshot of
//! the listeners under the lock and runs callbacks after releasing it, so a
//! callback may call `on`/`off` without deadlocking:
//!   - a listener removed during emission still runs in that round,
//!   - a listener added during emission runs from the next emit onwards.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::responsive::Responsive;

use super::events::{BreakpointEvent, Listener};

/// Named-event publish/subscribe primitive.
pub trait EventBus: Send + Sync {
    /// Registers `listener` for `event`.
    fn on(&self, event: &str, listener: &Listener);

    /// Registers `listener` for the next `event` only.
    fn once(&self, event: &str, listener: &Listener);

    /// Removes every registration of `listener` for `event`.
    ///
    /// Returns false if it was not registered.
    fn off(&self, event: &str, listener: &Listener) -> bool;

    /// Delivers `payload` to the listeners of `event`. Returns how many ran.
    fn emit(&self, event: &str, source: &Responsive, payload: &BreakpointEvent) -> usize;

    /// Number of listeners registered for `event`.
    fn listener_count(&self, event: &str) -> usize;
}

#[derive(Debug, Clone)]
struct Registration {
    listener: Listener,
    once: bool,
}

/// Default in-process [`EventBus`].
#[derive(Debug, Default)]
pub struct EventEmitter {
    listeners: Mutex<HashMap<String, Vec<Registration>>>,
}

impl EventEmitter {
    /// Creates an emitter with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, event: &str, listener: &Listener, once: bool) {
        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(Registration {
                listener: listener.clone(),
                once,
            });
    }
}

impl EventBus for EventEmitter {
    fn on(&self, event: &str, listener: &Listener) {
        self.register(event, listener, false);
    }

    fn once(&self, event: &str, listener: &Listener) {
        self.register(event, listener, true);
    }

    fn off(&self, event: &str, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(registrations) = listeners.get_mut(event) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.listener != *listener);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    fn emit(&self, event: &str, source: &Responsive, payload: &BreakpointEvent) -> usize {
        let snapshot: Vec<Listener> = {
            let mut listeners = self.listeners.lock();
            let Some(registrations) = listeners.get_mut(event) else {
                return 0;
            };
            let snapshot = registrations.iter().map(|r| r.listener.clone()).collect();
            // One-shot listeners leave before running so re-entrant emits skip them.
            registrations.retain(|r| !r.once);
            if registrations.is_empty() {
                listeners.remove(event);
            }
            snapshot
        };

        for listener in &snapshot {
            listener.call(source, payload);
        }
        snapshot.len()
    }

    fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::runtime::EventLoop;
    use crate::{BreakpointMap, MediaEnvironment, ResizeNotifier};

    fn source() -> Responsive {
        Responsive::builder()
            .breakpoints(BreakpointMap::from_pairs([("a", "q-a")]).unwrap())
            .evaluator(Arc::new(MediaEnvironment::new()))
            .notifier(Arc::new(ResizeNotifier::new()))
            .event_loop(Arc::new(EventLoop::new()))
            .without_events()
            .build()
            .unwrap()
    }

    fn payload() -> BreakpointEvent {
        BreakpointEvent::Enter {
            breakpoint: "a".to_string(),
        }
    }

    fn counting(hits: &Arc<AtomicUsize>) -> Listener {
        let hits = Arc::clone(hits);
        Listener::new(move |_, _| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn emit_reaches_only_matching_event() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        emitter.on("aenter", &counting(&hits));
        emitter.on("aleave", &counting(&hits));

        assert_eq!(emitter.emit("aenter", &source(), &payload()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.emit("nothing", &source(), &payload()), 0);
    }

    #[test]
    fn once_is_removed_after_first_emit() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        emitter.once("aenter", &counting(&hits));
        assert_eq!(emitter.listener_count("aenter"), 1);

        let src = source();
        emitter.emit("aenter", &src, &payload());
        emitter.emit("aenter", &src, &payload());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count("aenter"), 0);
    }

    #[test]
    fn off_reports_whether_listener_was_registered() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting(&hits);
        emitter.on("aenter", &listener);

        assert!(emitter.off("aenter", &listener));
        assert!(!emitter.off("aenter", &listener));
        assert!(!emitter.off("other", &listener));
        emitter.emit("aenter", &source(), &payload());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_added_during_emit_runs_next_round() {
        let emitter = Arc::new(EventEmitter::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let late = counting(&hits);
        let inner = Arc::clone(&emitter);
        emitter.once(
            "aenter",
            &Listener::new(move |_, _| inner.on("aenter", &late)),
        );

        let src = source();
        assert_eq!(emitter.emit("aenter", &src, &payload()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(emitter.emit("aenter", &src, &payload()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
