//! Query evaluator capability.
//!
//! The evaluator answers "does this condition expression currently hold?".
//! Hosts plug in their own implementation; when none is supplied the
//! process-wide [`MediaEnvironment`] returned by [`shared_environment`] is
//! used in its place.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::EvaluatorError;

/// Expression used when a breakpoint has an empty condition.
pub const MATCH_ALL: &str = "all";

/// Maps a condition expression to a boolean.
///
/// Implementations must be cheap and synchronous. An expression the
/// implementation cannot understand is reported as
/// `EvaluatorError::MalformedExpression`; the tracker never retries it.
pub trait QueryEvaluator: Send + Sync {
    /// Evaluates `expression` against the current environment.
    fn evaluate(&self, expression: &str) -> Result<bool, EvaluatorError>;
}

/// Adapts a closure into a [`QueryEvaluator`].
pub struct FnEvaluator<F>(F);

impl<F> FnEvaluator<F>
where
    F: Fn(&str) -> Result<bool, EvaluatorError> + Send + Sync,
{
    /// Wraps `f`.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> QueryEvaluator for FnEvaluator<F>
where
    F: Fn(&str) -> Result<bool, EvaluatorError> + Send + Sync,
{
    fn evaluate(&self, expression: &str) -> Result<bool, EvaluatorError> {
        (self.0)(expression)
    }
}

impl<F> fmt::Debug for FnEvaluator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEvaluator").finish_non_exhaustive()
    }
}

/// Table-driven evaluator standing in for a host environment.
///
/// Expressions are looked up verbatim. `"all"` matches unless overridden.
/// In lenient mode (the default) unknown expressions evaluate to `false`;
/// in strict mode they are rejected as malformed.
#[derive(Debug, Default)]
pub struct MediaEnvironment {
    matches: RwLock<HashMap<String, bool>>,
    strict: bool,
}

impl MediaEnvironment {
    /// Creates a lenient, empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment that rejects expressions it has not been told about.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            matches: RwLock::new(HashMap::new()),
            strict: true,
        }
    }

    /// Records whether `expression` currently matches.
    pub fn set(&self, expression: impl Into<String>, matches: bool) {
        self.matches.write().insert(expression.into(), matches);
    }

    /// Records several expressions at once, under a single write lock.
    pub fn set_many<I, E>(&self, entries: I)
    where
        I: IntoIterator<Item = (E, bool)>,
        E: Into<String>,
    {
        let mut guard = self.matches.write();
        for (expression, matches) in entries {
            guard.insert(expression.into(), matches);
        }
    }

    /// Forgets every recorded expression.
    pub fn clear(&self) {
        self.matches.write().clear();
    }
}

impl QueryEvaluator for MediaEnvironment {
    fn evaluate(&self, expression: &str) -> Result<bool, EvaluatorError> {
        if let Some(matches) = self.matches.read().get(expression) {
            return Ok(*matches);
        }
        if expression == MATCH_ALL {
            return Ok(true);
        }
        if self.strict {
            return Err(EvaluatorError::malformed(expression, "unrecognized condition"));
        }
        Ok(false)
    }
}

static SHARED_ENVIRONMENT: OnceLock<Arc<MediaEnvironment>> = OnceLock::new();

/// Returns the process-wide fallback environment, creating it on first use.
///
/// Every call returns the same instance.
pub fn shared_environment() -> Arc<MediaEnvironment> {
    Arc::clone(SHARED_ENVIRONMENT.get_or_init(|| {
        tracing::debug!("initializing shared media environment");
        Arc::new(MediaEnvironment::new())
    }))
}

/// The evaluator the tracker talks to.
///
/// Wraps either a host-supplied evaluator or the shared fallback, and applies
/// the empty-expression rule before delegating.
#[derive(Clone)]
pub struct EvaluatorAdapter {
    inner: Arc<dyn QueryEvaluator>,
    shimmed: bool,
}

impl EvaluatorAdapter {
    /// Uses `evaluator` when present, otherwise the shared environment.
    #[must_use]
    pub fn new(evaluator: Option<Arc<dyn QueryEvaluator>>) -> Self {
        match evaluator {
            Some(inner) => Self {
                inner,
                shimmed: false,
            },
            None => Self::shimmed(),
        }
    }

    /// Adapter over the shared fallback environment.
    #[must_use]
    pub fn shimmed() -> Self {
        let inner: Arc<dyn QueryEvaluator> = shared_environment();
        Self {
            inner,
            shimmed: true,
        }
    }

    /// Returns true if the fallback environment is in use.
    #[must_use]
    pub const fn is_shimmed(&self) -> bool {
        self.shimmed
    }

    /// Evaluates `expression`; an empty expression is treated as `"all"`.
    ///
    /// # Errors
    ///
    /// Propagates the wrapped evaluator's error unchanged.
    pub fn evaluate(&self, expression: &str) -> Result<bool, EvaluatorError> {
        let expression = if expression.trim().is_empty() {
            MATCH_ALL
        } else {
            expression
        };
        self.inner.evaluate(expression)
    }
}

impl fmt::Debug for EvaluatorAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatorAdapter")
            .field("shimmed", &self.shimmed)
            .finish_non_exhaustive()
    }
}
