//! Breakpoint event types.
//!
//! Event payloads are serializable so they can be logged or forwarded to
//! another process verbatim.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::responsive::Responsive;

/// Name of the aggregate leave event.
pub const AGGREGATE_LEAVE: &str = "breakpointleave";
/// Name of the aggregate enter event.
pub const AGGREGATE_ENTER: &str = "breakpointenter";

/// Event name fired when `breakpoint` stops matching.
#[must_use]
pub fn leave_event(breakpoint: &str) -> String {
    format!("{breakpoint}leave")
}

/// Event name fired when `breakpoint` starts matching.
#[must_use]
pub fn enter_event(breakpoint: &str) -> String {
    format!("{breakpoint}enter")
}

/// Payload delivered to listeners.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BreakpointEvent {
    /// Every breakpoint that left in this cycle (possibly none).
    AggregateLeave { breakpoints: Vec<String> },

    /// Every breakpoint that entered in this cycle (possibly none).
    AggregateEnter { breakpoints: Vec<String> },

    /// One breakpoint stopped matching.
    Leave { breakpoint: String },

    /// One breakpoint started matching.
    Enter { breakpoint: String },
}

impl BreakpointEvent {
    /// The event name this payload is emitted under.
    #[must_use]
    pub fn event_name(&self) -> String {
        match self {
            Self::AggregateLeave { .. } => AGGREGATE_LEAVE.to_string(),
            Self::AggregateEnter { .. } => AGGREGATE_ENTER.to_string(),
            Self::Leave { breakpoint } => leave_event(breakpoint),
            Self::Enter { breakpoint } => enter_event(breakpoint),
        }
    }

    /// Breakpoints carried by the event.
    #[must_use]
    pub fn breakpoints(&self) -> &[String] {
        match self {
            Self::AggregateLeave { breakpoints } | Self::AggregateEnter { breakpoints } => breakpoints.as_slice(),
            Self::Leave { breakpoint } | Self::Enter { breakpoint } => std::slice::from_ref(breakpoint),
        }
    }
}

/// Unique identifier for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new random listener id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback signature for breakpoint listeners.
pub type ListenerFn = dyn Fn(&Responsive, &BreakpointEvent) + Send + Sync;

/// A registered callback with a stable identity.
///
/// Clones share the same id, so the handle used for `on` can later be passed
/// to `off` to remove exactly that callback.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    callback: Arc<ListenerFn>,
}

impl Listener {
    /// Wraps `callback`.
    pub fn new(callback: impl Fn(&Responsive, &BreakpointEvent) + Send + Sync + 'static) -> Self {
        Self {
            id: ListenerId::new(),
            callback: Arc::new(callback),
        }
    }

    /// The listener's identity.
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Invokes the callback.
    pub fn call(&self, source: &Responsive, event: &BreakpointEvent) {
        (self.callback)(source, event);
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish_non_exhaustive()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Listener {}
