//! Error types for responsive.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the exact failure instead of inspecting strings.

use thiserror::Error;

/// Errors raised by a [`QueryEvaluator`](crate::evaluator::QueryEvaluator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluatorError {
    #[error("Malformed condition expression '{expression}': {reason}")]
    MalformedExpression {
        expression: String,
        reason: String,
    },

    #[error("Query evaluator unavailable: {reason}")]
    Unavailable {
        reason: String,
    },
}

impl EvaluatorError {
    /// Creates a malformed-expression error.
    #[must_use]
    pub fn malformed(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration errors raised while building a breakpoint map or config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Breakpoint '{name}' is defined more than once")]
    DuplicateBreakpoint {
        name: String,
    },

    #[error("Breakpoint name cannot be empty")]
    EmptyBreakpointName,

    #[error("Throttle window must be greater than zero, got {throttle_ms}ms")]
    InvalidThrottle {
        throttle_ms: u64,
    },

    #[error("Failed to parse configuration: {message}")]
    Parse {
        message: String,
    },
}

/// Top-level error type for responsive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponsiveError {
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluatorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ResponsiveError {
    /// Returns true if this is an evaluation error.
    #[must_use]
    pub const fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for responsive operations.
pub type ResponsiveResult<T> = Result<T, ResponsiveError>;
