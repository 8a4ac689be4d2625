//! Vendor-neutral query model.
//!
//! Defines the `Query` structure handed to dashboard renderers. One
//! query is derived from one detected signal; renderers decide how many
//! panels a query expands into.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The query lane a signal maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Log-source queries.
    Logs,
    /// Metric-source queries.
    Metrics,
    /// Trace-source queries. Declared but not yet produced by any
    /// normalizer; bundles always carry an empty trace lane.
    Traces,
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logs => write!(f, "logs"),
            Self::Metrics => write!(f, "metrics"),
            Self::Traces => write!(f, "traces"),
        }
    }
}

/// A dashboard time range.
///
/// Both bounds are opaque expressions (e.g., `now-30m`) passed through
/// to the rendered dashboard untouched; the core never parses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range.
    pub from: String,
    /// End of the range.
    pub to: String,
}

impl TimeRange {
    /// Creates a time range from two opaque expressions.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::new("now-30m", "now")
    }
}

/// A vendor-neutral dashboard query derived from one detected signal.
///
/// Source location and detector metadata are carried verbatim so a
/// rendered panel can always be traced back to the call site that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Which query lane this belongs to.
    #[serde(rename = "type")]
    pub query_type: QueryType,

    /// The signal name. May be empty when the detector could not
    /// resolve it.
    #[serde(default)]
    pub name: String,

    /// The time range the query covers.
    pub time_range: TimeRange,

    /// Path of the source file the signal was detected in.
    pub source_file: String,

    /// The class defining the enclosing method.
    #[serde(default)]
    pub defining_class: String,

    /// Kind-specific detector metadata (level, line, metric_type, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Query {
    /// Returns a metadata value as a string, if present and textual.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(serde_json::Value::as_str)
    }

    /// Returns a metadata value as an unsigned integer, if present and
    /// numeric.
    #[must_use]
    pub fn metadata_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(serde_json::Value::as_u64)
    }
}
