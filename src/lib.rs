//! # responsive - breakpoint tracking
//!
//! Tracks which of a set of named conditions ("breakpoints", e.g. viewport
//! size classes) currently hold, and tells listeners exactly when one starts
//! or stops holding.
//!
//! ## Core Concepts
//!
//! - **Breakpoint**: a name bound to an opaque condition expression
//! - **Active set**: the breakpoints whose expressions currently evaluate true
//! - **Query evaluator**: answers whether an expression holds right now
//! - **Change notifier**: signals that the environment may have changed;
//!   notifications are throttled before they trigger a recompute
//!
//! Every change produces, in order: `breakpointleave` (all names that left),
//! `breakpointenter` (all names that entered), then `<name>leave` and
//! `<name>enter` per name.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use responsive::{EventLoop, Listener, Responsive};
//!
//! let event_loop = Arc::new(EventLoop::new());
//! let tracker = Responsive::new(Arc::clone(&event_loop))?;
//!
//! tracker.on("deskenter", &Listener::new(|source, _| {
//!     println!("desk layout, active: {:?}", source.current_breakpoints());
//! }));
//!
//! // Deliver the initial events and any throttled recomputes.
//! event_loop.run_for(chrono::Duration::seconds(5));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod breakpoint;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod tracker;

pub mod monitor;
pub mod responsive;
pub mod runtime;

// Re-export primary types at crate root for convenience
pub use breakpoint::{Breakpoint, BreakpointMap, DEFAULT_BREAKPOINTS};
pub use config::{ResponsiveConfig, DEFAULT_THROTTLE_MS};
pub use error::{ConfigError, EvaluatorError, ResponsiveError, ResponsiveResult};
pub use evaluator::{shared_environment, EvaluatorAdapter, FnEvaluator, MediaEnvironment, QueryEvaluator};
pub use monitor::{
    BreakpointEvent, ChangeNotifier, EventBus, EventEmitter, Listener, ListenerId, ResizeNotifier,
    AGGREGATE_ENTER, AGGREGATE_LEAVE,
};
pub use responsive::{DispatchMode, Responsive, ResponsiveBuilder};
pub use runtime::{Clock, EventLoop, ManualClock, SystemClock, Throttle};
pub use tracker::{BreakpointDiff, BreakpointTracker};
