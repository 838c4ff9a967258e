//! The breakpoint tracker handle.
//!
//! `Responsive` coordinates the pieces: it subscribes a throttled handler to
//! the change notifier, recomputes the active set, and turns every change
//! into a fixed sequence of named events on the (optional) event bus.
//!
//! Construction subscribes first and then computes the initial state. The
//! initial events are deferred to the next turn of the event loop, so
//! listeners attached right after `build()` returns still see them. Any
//! immediate dispatch that happens first flushes them ahead of its own events.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::Duration;
use parking_lot::Mutex;

use crate::breakpoint::BreakpointMap;
use crate::config::ResponsiveConfig;
use crate::error::ResponsiveResult;
use crate::evaluator::{EvaluatorAdapter, QueryEvaluator};
use crate::monitor::{
    enter_event, leave_event, BreakpointEvent, ChangeNotifier, EventBus, EventEmitter, Listener,
    NotifierSubscription, ResizeNotifier, AGGREGATE_ENTER, AGGREGATE_LEAVE,
};
use crate::runtime::{EventLoop, Throttle};
use crate::tracker::{BreakpointDiff, BreakpointTracker};

/// When the events of an update are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    /// Within the `update` call.
    Immediate,
    /// On the next turn of the event loop.
    Deferred,
}

struct Inner {
    breakpoints: Arc<BreakpointMap>,
    tracker: Mutex<BreakpointTracker>,
    evaluator: EvaluatorAdapter,
    events: Option<Arc<dyn EventBus>>,
    notifier: Arc<dyn ChangeNotifier>,
    event_loop: Arc<EventLoop>,
    cooldown: Duration,
    listening: AtomicBool,
    listener: Mutex<Option<(NotifierSubscription, Throttle)>>,
    /// Diffs recorded by deferred updates and not yet emitted.
    pending: Mutex<Vec<BreakpointDiff>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some((subscription, throttle)) = self.listener.get_mut().take() {
            throttle.cancel();
            self.notifier.unsubscribe(subscription);
        }
    }
}

/// Tracks which breakpoints are active and emits enter/leave events.
///
/// Cloning is cheap; clones share the same state. Dropping the last clone
/// detaches from the change notifier.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use responsive::{BreakpointMap, EventLoop, MediaEnvironment, Responsive, ResizeNotifier};
///
/// let env = Arc::new(MediaEnvironment::new());
/// env.set("(max-width: 599px)", true);
///
/// let tracker = Responsive::builder()
///     .breakpoints(BreakpointMap::from_pairs([
///         ("small", "(max-width: 599px)"),
///         ("large", "(min-width: 600px)"),
///     ])?)
///     .evaluator(env)
///     .notifier(Arc::new(ResizeNotifier::new()))
///     .event_loop(Arc::new(EventLoop::new()))
///     .build()?;
///
/// assert!(tracker.is("small"));
/// assert!(tracker.not("large"));
/// # Ok::<(), responsive::ResponsiveError>(())
/// ```
#[derive(Clone)]
pub struct Responsive {
    inner: Arc<Inner>,
}

impl Responsive {
    /// Tracks the built-in breakpoints with every collaborator defaulted.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the initial recompute fails.
    pub fn new(event_loop: Arc<EventLoop>) -> ResponsiveResult<Self> {
        Self::builder().event_loop(event_loop).build()
    }

    /// Tracks `breakpoints` with every other collaborator defaulted.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the initial recompute fails.
    pub fn with_breakpoints(breakpoints: BreakpointMap, event_loop: Arc<EventLoop>) -> ResponsiveResult<Self> {
        Self::builder().breakpoints(breakpoints).event_loop(event_loop).build()
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> ResponsiveBuilder {
        ResponsiveBuilder::default()
    }

    fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    /// Subscribes the throttled update handler to the change notifier.
    ///
    /// Only the first call subscribes; later calls do nothing.
    pub fn listen(&self) -> &Self {
        if self
            .inner
            .listening
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("already listening for changes");
            return self;
        }

        let weak = self.downgrade();
        let throttle = Throttle::new(Arc::clone(&self.inner.event_loop), self.inner.cooldown, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Err(err) = Responsive::from_inner(inner).update_with(DispatchMode::Immediate) {
                tracing::error!(error = %err, "change-driven update failed");
            }
        });

        let trigger = throttle.clone();
        let subscription = self.inner.notifier.subscribe(Arc::new(move || trigger.call()));
        *self.inner.listener.lock() = Some((subscription, throttle));

        tracing::debug!(
            cooldown_ms = self.inner.cooldown.num_milliseconds(),
            "listening for changes"
        );
        self
    }

    /// Returns true once [`listen`](Self::listen) has subscribed.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::Acquire)
    }

    /// Recomputes the active set and dispatches any change immediately.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if any expression fails to evaluate; the
    /// active set is unchanged and no events fire.
    pub fn update(&self) -> ResponsiveResult<BreakpointDiff> {
        self.update_with(DispatchMode::Immediate)
    }

    /// Recomputes the active set and dispatches any change per `mode`.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if any expression fails to evaluate.
    pub fn update_with(&self, mode: DispatchMode) -> ResponsiveResult<BreakpointDiff> {
        let diff = self.inner.tracker.lock().recompute(&self.inner.evaluator)?;

        if !diff.is_changed() {
            tracing::trace!(active = ?diff.current, "breakpoints unchanged");
            return Ok(diff);
        }
        tracing::debug!(entered = ?diff.entered, left = ?diff.left, ?mode, "breakpoints changed");

        match mode {
            DispatchMode::Immediate => self.dispatch_now(&diff),
            DispatchMode::Deferred => {
                self.inner.pending.lock().push(diff.clone());
                let weak = self.downgrade();
                self.inner.event_loop.defer(move || {
                    if let Some(inner) = weak.upgrade() {
                        Responsive::from_inner(inner).flush_pending();
                    }
                });
            }
        }
        Ok(diff)
    }

    /// Emits the events describing a move from `previous` to `current`.
    ///
    /// Deferred events still waiting for the next turn are emitted first.
    pub fn dispatch_events(&self, current: &[String], previous: &[String]) {
        let diff = BreakpointDiff::between(previous.to_vec(), current.to_vec());
        self.dispatch_now(&diff);
    }

    fn dispatch_now(&self, diff: &BreakpointDiff) {
        self.flush_pending();
        self.emit_diff(diff);
    }

    /// Emits every deferred diff in the order it was recorded. A no-op once
    /// an earlier flush has taken them.
    fn flush_pending(&self) {
        let pending = std::mem::take(&mut *self.inner.pending.lock());
        if pending.is_empty() {
            return;
        }
        tracing::trace!(count = pending.len(), "flushing deferred dispatch");
        for diff in &pending {
            self.emit_diff(diff);
        }
    }

    fn emit_diff(&self, diff: &BreakpointDiff) {
        let Some(bus) = &self.inner.events else {
            tracing::debug!("no event bus, skipping dispatch");
            return;
        };

        bus.emit(
            AGGREGATE_LEAVE,
            self,
            &BreakpointEvent::AggregateLeave {
                breakpoints: diff.left.clone(),
            },
        );
        bus.emit(
            AGGREGATE_ENTER,
            self,
            &BreakpointEvent::AggregateEnter {
                breakpoints: diff.entered.clone(),
            },
        );
        for name in &diff.left {
            bus.emit(
                &leave_event(name),
                self,
                &BreakpointEvent::Leave {
                    breakpoint: name.clone(),
                },
            );
        }
        for name in &diff.entered {
            bus.emit(
                &enter_event(name),
                self,
                &BreakpointEvent::Enter {
                    breakpoint: name.clone(),
                },
            );
        }
    }

    /// Expression registered for `name`.
    #[must_use]
    pub fn get_breakpoint(&self, name: &str) -> Option<&str> {
        self.inner.breakpoints.get(name)
    }

    /// The tracked breakpoint map.
    #[must_use]
    pub fn breakpoints(&self) -> &BreakpointMap {
        &self.inner.breakpoints
    }

    /// Snapshot of the active breakpoints, in map order.
    #[must_use]
    pub fn current_breakpoints(&self) -> Vec<String> {
        self.inner.tracker.lock().current_breakpoints().to_vec()
    }

    /// Returns true if `name` is active. Unknown names are never active.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.inner.tracker.lock().is(name)
    }

    /// Returns true if `name` is not active.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self, name: &str) -> bool {
        !self.is(name)
    }

    /// Returns true if an event bus is attached.
    #[must_use]
    pub fn has_events(&self) -> bool {
        self.inner.events.is_some()
    }

    /// The event loop this tracker schedules on.
    #[must_use]
    pub fn event_loop(&self) -> &Arc<EventLoop> {
        &self.inner.event_loop
    }

    /// Registers `listener` for `event`.
    pub fn on(&self, event: &str, listener: &Listener) -> &Self {
        match &self.inner.events {
            Some(bus) => bus.on(event, listener),
            None => tracing::warn!(event, "no event bus attached, ignoring on()"),
        }
        self
    }

    /// Registers `listener` for the next `event` only.
    pub fn once(&self, event: &str, listener: &Listener) -> &Self {
        match &self.inner.events {
            Some(bus) => bus.once(event, listener),
            None => tracing::warn!(event, "no event bus attached, ignoring once()"),
        }
        self
    }

    /// Removes `listener` from `event`.
    pub fn off(&self, event: &str, listener: &Listener) -> &Self {
        match &self.inner.events {
            Some(bus) => {
                bus.off(event, listener);
            }
            None => tracing::warn!(event, "no event bus attached, ignoring off()"),
        }
        self
    }
}

impl fmt::Debug for Responsive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responsive")
            .field("breakpoints", &self.inner.breakpoints.len())
            .field("active", &self.current_breakpoints())
            .field("listening", &self.is_listening())
            .field("has_events", &self.has_events())
            .finish_non_exhaustive()
    }
}

enum EventsChoice {
    Default,
    Custom(Arc<dyn EventBus>),
    Disabled,
}

/// Builder for [`Responsive`].
pub struct ResponsiveBuilder {
    config: ResponsiveConfig,
    breakpoints: Option<BreakpointMap>,
    evaluator: Option<Arc<dyn QueryEvaluator>>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    events: EventsChoice,
    event_loop: Option<Arc<EventLoop>>,
}

impl Default for ResponsiveBuilder {
    fn default() -> Self {
        Self {
            config: ResponsiveConfig::default(),
            breakpoints: None,
            evaluator: None,
            notifier: None,
            events: EventsChoice::Default,
            event_loop: None,
        }
    }
}

impl ResponsiveBuilder {
    /// Applies a configuration. Breakpoints set with
    /// [`breakpoints`](Self::breakpoints) take precedence over the config's.
    #[must_use]
    pub fn config(mut self, config: ResponsiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Breakpoints to track.
    #[must_use]
    pub fn breakpoints(mut self, breakpoints: BreakpointMap) -> Self {
        self.breakpoints = Some(breakpoints);
        self
    }

    /// Query evaluator; the shared environment is used when unset.
    #[must_use]
    pub fn evaluator(mut self, evaluator: Arc<dyn QueryEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Change notifier; [`ResizeNotifier::global`] is used when unset.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Event bus; an [`EventEmitter`] is created when unset.
    #[must_use]
    pub fn events(mut self, events: Arc<dyn EventBus>) -> Self {
        self.events = EventsChoice::Custom(events);
        self
    }

    /// Runs without an event bus (query-only mode).
    #[must_use]
    pub fn without_events(mut self) -> Self {
        self.events = EventsChoice::Disabled;
        self
    }

    /// Event loop for timers and deferred dispatch; a wall-clock loop is
    /// created when unset.
    #[must_use]
    pub fn event_loop(mut self, event_loop: Arc<EventLoop>) -> Self {
        self.event_loop = Some(event_loop);
        self
    }

    /// Builds the tracker: subscribes to changes, then computes the initial
    /// state with its events deferred to the next turn.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid config and an evaluation
    /// error if the initial recompute fails.
    pub fn build(self) -> ResponsiveResult<Responsive> {
        self.config.validate()?;

        let cooldown = self.config.throttle();
        let breakpoints = Arc::new(self.breakpoints.unwrap_or(self.config.breakpoints));
        let events: Option<Arc<dyn EventBus>> = match self.events {
            EventsChoice::Default => Some(Arc::new(EventEmitter::new())),
            EventsChoice::Custom(bus) => Some(bus),
            EventsChoice::Disabled => None,
        };
        let notifier: Arc<dyn ChangeNotifier> = match self.notifier {
            Some(notifier) => notifier,
            None => ResizeNotifier::global(),
        };

        let inner = Inner {
            tracker: Mutex::new(BreakpointTracker::new(Arc::clone(&breakpoints))),
            breakpoints,
            evaluator: EvaluatorAdapter::new(self.evaluator),
            events,
            notifier,
            event_loop: self.event_loop.unwrap_or_else(|| Arc::new(EventLoop::new())),
            cooldown,
            listening: AtomicBool::new(false),
            listener: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
        };

        let responsive = Responsive::from_inner(Arc::new(inner));
        responsive.listen();
        responsive.update_with(DispatchMode::Deferred)?;
        Ok(responsive)
    }
}
