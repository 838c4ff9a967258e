//! Breakpoint state tracking.
//!
//! The tracker owns the breakpoint map and the active set. `recompute`
//! evaluates every breakpoint, then swaps the new active set in only once
//! all evaluations have succeeded.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::breakpoint::BreakpointMap;
use crate::error::ResponsiveResult;
use crate::evaluator::EvaluatorAdapter;

/// Result of one recompute: both active sets and the deltas between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointDiff {
    /// Active set before the recompute.
    pub previous: Vec<String>,
    /// Active set after the recompute.
    pub current: Vec<String>,
    /// Names in `current` but not in `previous`, in `current` order.
    pub entered: Vec<String>,
    /// Names in `previous` but not in `current`, in `previous` order.
    pub left: Vec<String>,
}

impl BreakpointDiff {
    /// Computes the deltas between two active sets.
    #[must_use]
    pub fn between(previous: Vec<String>, current: Vec<String>) -> Self {
        let prev_set: HashSet<&str> = previous.iter().map(String::as_str).collect();
        let curr_set: HashSet<&str> = current.iter().map(String::as_str).collect();

        let entered = current
            .iter()
            .filter(|name| !prev_set.contains(name.as_str()))
            .cloned()
            .collect();
        let left = previous
            .iter()
            .filter(|name| !curr_set.contains(name.as_str()))
            .cloned()
            .collect();

        Self {
            previous,
            current,
            entered,
            left,
        }
    }

    /// Returns true if the active set changed (order-independent).
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.entered.is_empty() || !self.left.is_empty()
    }
}

/// Owns the breakpoint map and the current active set.
#[derive(Debug, Clone)]
pub struct BreakpointTracker {
    breakpoints: Arc<BreakpointMap>,
    active: Vec<String>,
}

impl BreakpointTracker {
    /// Creates a tracker with an empty active set.
    #[must_use]
    pub fn new(breakpoints: impl Into<Arc<BreakpointMap>>) -> Self {
        Self {
            breakpoints: breakpoints.into(),
            active: Vec::new(),
        }
    }

    /// The breakpoint map.
    #[must_use]
    pub fn breakpoints(&self) -> &BreakpointMap {
        &self.breakpoints
    }

    /// Re-evaluates every breakpoint and replaces the active set.
    ///
    /// # Errors
    ///
    /// Returns `ResponsiveError::Evaluation` if any expression fails to
    /// evaluate. The stored active set is left untouched in that case.
    pub fn recompute(&mut self, evaluator: &EvaluatorAdapter) -> ResponsiveResult<BreakpointDiff> {
        let mut next = Vec::with_capacity(self.breakpoints.len());
        for bp in self.breakpoints.iter() {
            if evaluator.evaluate(&bp.expression)? {
                next.push(bp.name.clone());
            }
        }

        let previous = std::mem::replace(&mut self.active, next.clone());
        Ok(BreakpointDiff::between(previous, next))
    }

    /// Names of the currently active breakpoints, in map order.
    #[must_use]
    pub fn current_breakpoints(&self) -> &[String] {
        &self.active
    }

    /// Returns true if `name` is active. Unknown names are never active.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.active.iter().any(|active| active == name)
    }

    /// Negation of [`is`](Self::is).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self, name: &str) -> bool {
        !self.is(name)
    }

    /// Expression registered for `name`.
    #[must_use]
    pub fn get_breakpoint(&self, name: &str) -> Option<&str> {
        self.breakpoints.get(name)
    }
}
