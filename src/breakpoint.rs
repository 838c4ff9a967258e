//! Breakpoint definitions.
//!
//! A breakpoint is a named condition expression. Expressions are opaque: they
//! are handed to the query evaluator unchanged and never parsed here.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Built-in viewport breakpoints, in declaration order.
pub const DEFAULT_BREAKPOINTS: [(&str, &str); 7] = [
    ("palm", "screen and (max-width: 719px)"),
    ("lap", "screen and (min-width: 720px) and (max-width: 1023px)"),
    ("lap-and-up", "screen and (min-width: 720px)"),
    ("portable", "screen and (max-width: 1023px)"),
    ("desk", "screen and (min-width: 1024px)"),
    ("desk-wide", "screen and (min-width: 1280px)"),
    (
        "retina",
        "(-webkit-min-device-pixel-ratio: 2), (min-resolution: 192dpi), (min-resolution: 2dppx)",
    ),
];

/// A single named condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    /// Unique breakpoint name (e.g. `"palm"`).
    pub name: String,
    /// Condition expression passed to the evaluator.
    pub expression: String,
}

/// Immutable mapping from breakpoint name to condition expression.
///
/// Names are unique. Iteration follows declaration order, which is also the
/// order of the active set produced by the tracker.
///
/// # Examples
///
/// ```
/// use responsive::BreakpointMap;
///
/// let map = BreakpointMap::from_pairs([
///     ("small", "(max-width: 599px)"),
///     ("large", "(min-width: 600px)"),
/// ])
/// .unwrap();
/// assert_eq!(map.get("large"), Some("(min-width: 600px)"));
/// assert_eq!(map.names().collect::<Vec<_>>(), vec!["small", "large"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointMap {
    entries: Vec<Breakpoint>,
}

impl BreakpointMap {
    /// Builds a map from `(name, expression)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyBreakpointName` for a blank name and
    /// `ConfigError::DuplicateBreakpoint` when a name repeats.
    pub fn from_pairs<I, N, E>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, E)>,
        N: Into<String>,
        E: Into<String>,
    {
        let mut entries: Vec<Breakpoint> = Vec::new();
        for (name, expression) in pairs {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyBreakpointName);
            }
            if entries.iter().any(|bp| bp.name == name) {
                return Err(ConfigError::DuplicateBreakpoint { name });
            }
            entries.push(Breakpoint {
                name,
                expression: expression.into(),
            });
        }
        Ok(Self { entries })
    }

    /// Returns the expression registered for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|bp| bp.name == name)
            .map(|bp| bp.expression.as_str())
    }

    /// Returns true if `name` is a known breakpoint.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|bp| bp.name == name)
    }

    /// Iterates breakpoints in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.entries.iter()
    }

    /// Iterates breakpoint names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|bp| bp.name.as_str())
    }

    /// Number of breakpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no breakpoints are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BreakpointMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_BREAKPOINTS
                .iter()
                .map(|(name, expression)| Breakpoint {
                    name: (*name).to_string(),
                    expression: (*expression).to_string(),
                })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BreakpointMap {
    type Item = &'a Breakpoint;
    type IntoIter = std::slice::Iter<'a, Breakpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for BreakpointMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for bp in &self.entries {
            map.serialize_entry(&bp.name, &bp.expression)?;
        }
        map.end()
    }
}

// Visits the JSON object directly so document key order survives.
struct BreakpointMapVisitor;

impl<'de> Visitor<'de> for BreakpointMapVisitor {
    type Value = BreakpointMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of breakpoint names to condition expressions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut pairs: Vec<(String, String)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, expression)) = access.next_entry::<String, String>()? {
            pairs.push((name, expression));
        }
        BreakpointMap::from_pairs(pairs).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for BreakpointMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(BreakpointMapVisitor)
    }
}
