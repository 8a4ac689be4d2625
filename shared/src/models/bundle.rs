//! Query bundle data model.
//!
//! A `Bundle` is the fully-resolved, vendor-neutral set of queries plus
//! metadata handed to a dashboard renderer. It is a pure value: built
//! once per run, never mutated, and serializes losslessly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::query::{Query, TimeRange};
use super::signal::DynamicMetric;

/// Description of the change set that was inspected.
///
/// Embedded verbatim into [`BundleMetadata`]; the core never interprets
/// any of these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChangeSet {
    /// Branch name of the change.
    #[validate(length(min = 1, message = "Branch name cannot be empty"))]
    pub branch: String,

    /// Human-readable description (PR title or commit subject).
    #[serde(default)]
    pub description: String,

    /// Changed file paths, already filtered for relevance.
    #[serde(default)]
    pub files: Vec<String>,

    /// When the change set was inspected, if the caller recorded it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_at: Option<DateTime<Utc>>,
}

impl ChangeSet {
    /// Creates a change-set descriptor for a branch.
    #[must_use]
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            description: String::new(),
            files: Vec::new(),
            detected_at: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the changed file list.
    #[must_use]
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    /// Sets the inspection timestamp.
    #[must_use]
    pub fn with_detected_at(mut self, detected_at: DateTime<Utc>) -> Self {
        self.detected_at = Some(detected_at);
        self
    }
}

/// Metadata carried alongside the query lanes of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// The change set the queries were derived from.
    pub change_set: ChangeSet,

    /// The time range all queries cover.
    pub time_range: TimeRange,

    /// Metric calls whose names could not be statically resolved.
    #[serde(default)]
    pub dynamic_metrics: Vec<DynamicMetric>,

    /// Human-readable truncation warnings from the limit engine, in the
    /// order they were recorded.
    #[serde(default)]
    pub limit_warnings: Vec<String>,
}

/// The vendor-neutral query bundle handed to renderers.
///
/// Lanes preserve detection order. The trace lane is declared but not
/// yet populated by any normalizer; it is always empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Log queries, in detection order.
    pub logs: Vec<Query>,

    /// Metric queries, in detection order.
    pub metrics: Vec<Query>,

    /// Trace queries. Always empty.
    pub traces: Vec<Query>,

    /// Change-set description, time range, dynamic metrics, warnings.
    pub metadata: BundleMetadata,
}

impl Bundle {
    /// Returns true when the bundle contains no queries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.metrics.is_empty() && self.traces.is_empty()
    }

    /// Returns the total number of queries across all lanes.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.logs.len() + self.metrics.len() + self.traces.len()
    }
}
