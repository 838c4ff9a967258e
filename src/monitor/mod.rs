//! Observation side of the tracker.
//!
//! Change notifications come in through a [`ChangeNotifier`]; breakpoint
//! events go out through an [`EventBus`]. Both are traits so a host can
//! supply its own, with [`ResizeNotifier`] and [`EventEmitter`] as the
//! in-process defaults.

/// Publish/subscribe bus.
pub mod emitter;
/// Event payloads and listener handles.
pub mod events;
/// Change notification source.
pub mod notifier;

pub use emitter::{EventBus, EventEmitter};
pub use events::{
    enter_event, leave_event, BreakpointEvent, Listener, ListenerFn, ListenerId, AGGREGATE_ENTER,
    AGGREGATE_LEAVE,
};
pub use notifier::{ChangeCallback, ChangeNotifier, NotifierSubscription, ResizeNotifier};
