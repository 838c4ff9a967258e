//! Tracker configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::breakpoint::BreakpointMap;
use crate::error::ConfigError;

/// Default cooldown between resize-driven recomputes.
pub const DEFAULT_THROTTLE_MS: u64 = 1000;

/// Configuration for a [`Responsive`](crate::Responsive) tracker.
///
/// Missing fields fall back to their defaults when deserializing:
///
/// ```
/// use responsive::ResponsiveConfig;
///
/// let cfg = ResponsiveConfig::from_json_str(r#"{"throttle_ms": 250}"#).unwrap();
/// assert_eq!(cfg.throttle_ms, 250);
/// assert_eq!(cfg.breakpoints.len(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsiveConfig {
    /// Cooldown window of the resize throttle, in milliseconds.
    pub throttle_ms: u64,
    /// Breakpoints to track.
    pub breakpoints: BreakpointMap,
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            throttle_ms: DEFAULT_THROTTLE_MS,
            breakpoints: BreakpointMap::default(),
        }
    }
}

impl ResponsiveConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON or breakpoint maps,
    /// and any error reported by [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidThrottle` if `throttle_ms` is zero or too
    /// large to represent as a duration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.throttle_ms == 0 || i64::try_from(self.throttle_ms).is_err() {
            return Err(ConfigError::InvalidThrottle {
                throttle_ms: self.throttle_ms,
            });
        }
        Ok(())
    }

    /// The throttle window as a duration.
    #[must_use]
    pub fn throttle(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.throttle_ms).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ResponsiveConfig::default();
        assert_eq!(cfg.throttle_ms, 1000);
        assert_eq!(cfg.throttle(), Duration::seconds(1));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_custom_breakpoints_from_json() {
        let cfg = ResponsiveConfig::from_json_str(
            r#"{"breakpoints": {"small": "(max-width: 599px)", "large": "(min-width: 600px)"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.throttle_ms, DEFAULT_THROTTLE_MS);
        assert_eq!(cfg.breakpoints.names().collect::<Vec<_>>(), vec!["small", "large"]);
    }

    #[test]
    fn test_zero_throttle_rejected() {
        let err = ResponsiveConfig::from_json_str(r#"{"throttle_ms": 0}"#).unwrap_err();
        assert_eq!(err, ConfigError::InvalidThrottle { throttle_ms: 0 });
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = ResponsiveConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_duplicate_breakpoint_is_parse_error() {
        let err = ResponsiveConfig::from_json_str(r#"{"breakpoints": {"a": "x", "a": "y"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { message } if message.contains("more than once")));
    }
}
