//! Raw signal data model.
//!
//! Defines the `RawSignal` structure produced by the external source
//! detector for every instrumentation call site it finds in a change set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use super::bundle::ChangeSet;
use super::query::TimeRange;

/// Kind of detected instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// A log statement (e.g., `logger.info`).
    Log,
    /// A monotonically increasing counter metric.
    Counter,
    /// A gauge metric that can go up or down.
    Gauge,
    /// A histogram metric for measuring distributions.
    Histogram,
    /// A structured analytics event.
    Event,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Counter => write!(f, "counter"),
            Self::Gauge => write!(f, "gauge"),
            Self::Histogram => write!(f, "histogram"),
            Self::Event => write!(f, "event"),
        }
    }
}

impl SignalKind {
    /// Returns the logical budget class this kind counts against.
    #[must_use]
    pub fn class(self) -> SignalClass {
        match self {
            Self::Log => SignalClass::Log,
            Self::Counter | Self::Gauge | Self::Histogram => SignalClass::Metric,
            Self::Event => SignalClass::Event,
        }
    }

    /// Returns the number of dashboard panels a signal of this kind
    /// expands into.
    ///
    /// Histograms render as three percentile panels (p50, p95, p99);
    /// every other kind occupies a single panel slot. Events are not
    /// rendered as panels at all but still weigh one slot so they count
    /// against the total panel budget.
    #[must_use]
    pub fn panel_weight(self) -> usize {
        match self {
            Self::Histogram => 3,
            Self::Log | Self::Counter | Self::Gauge | Self::Event => 1,
        }
    }
}

/// Logical budget class used by the limit engine.
///
/// The lowercase `Display` spelling appears verbatim in limit warnings
/// surfaced to CI logs and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalClass {
    /// Log statements.
    Log,
    /// Counter, gauge, and histogram metrics.
    Metric,
    /// Analytics events.
    Event,
}

impl std::fmt::Display for SignalClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Metric => write!(f, "metric"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// Detector confidence in a signal.
///
/// Low confidence means the detector matched the call-site pattern but
/// could not fully resolve its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The signal name and kind were resolved statically.
    High,
    /// The call site matched but some detail was inferred.
    Low,
}

impl Default for Confidence {
    fn default() -> Self {
        Self::High
    }
}

/// A single detected instrumentation call site.
///
/// Produced once by the external detector and never mutated afterwards.
/// `inheritance_depth` and `confidence` are carried for downstream
/// consumers (ranking, debugging); the limit and render logic does not
/// branch on them.
///
/// # Example
///
/// ```
/// use shared::models::{RawSignal, SignalKind, SignalClass};
///
/// let signal = RawSignal::new(SignalKind::Counter, "orders_created", "app/models/order.rb")
///     .with_defining_class("Order")
///     .with_metadata("line", serde_json::json!(17));
///
/// assert_eq!(signal.kind.class(), SignalClass::Metric);
/// assert_eq!(signal.panel_weight(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    /// What kind of instrumentation this is.
    pub kind: SignalKind,

    /// The resolved signal name. Empty when the detector could not
    /// resolve it statically.
    #[serde(default)]
    pub name: String,

    /// Path of the source file the call site lives in.
    pub source_file: String,

    /// The class defining the enclosing method.
    #[serde(default)]
    pub defining_class: String,

    /// Distance from the call-site class to the class defining the
    /// enclosing method.
    #[serde(default)]
    pub inheritance_depth: u32,

    /// Detector confidence for this signal.
    #[serde(default)]
    pub confidence: Confidence,

    /// Kind-specific detector output (level, line, metric_type, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RawSignal {
    /// Creates a new signal with empty metadata and high confidence.
    #[must_use]
    pub fn new(kind: SignalKind, name: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            source_file: source_file.into(),
            defining_class: String::new(),
            inheritance_depth: 0,
            confidence: Confidence::High,
            metadata: HashMap::new(),
        }
    }

    /// Sets the defining class.
    #[must_use]
    pub fn with_defining_class(mut self, class: impl Into<String>) -> Self {
        self.defining_class = class.into();
        self
    }

    /// Sets the inheritance depth.
    #[must_use]
    pub fn with_inheritance_depth(mut self, depth: u32) -> Self {
        self.inheritance_depth = depth;
        self
    }

    /// Sets the detector confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the number of dashboard panels this signal expands into.
    #[must_use]
    pub fn panel_weight(&self) -> usize {
        self.kind.panel_weight()
    }
}

/// A metric call whose name could not be statically resolved.
///
/// Dynamic metrics produce no panels; they are listed in the bundle
/// metadata so reviewers know the dashboard is incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicMetric {
    /// The source expression used as the metric name.
    pub name_expression: String,

    /// Path of the source file the call site lives in.
    pub source_file: String,

    /// Line number of the call site, when the detector recorded one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}

/// The full detector output for one change set, as consumed at the
/// pipeline boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetectorReport {
    /// The change set the signals were detected in.
    #[validate(nested)]
    pub change_set: ChangeSet,

    /// All detected signals, in detection order.
    #[serde(default)]
    pub signals: Vec<RawSignal>,

    /// Metric calls whose names could not be resolved.
    #[serde(default)]
    pub dynamic_metrics: Vec<DynamicMetric>,

    /// Optional time range override for all generated queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_class_mapping() {
        assert_eq!(SignalKind::Log.class(), SignalClass::Log);
        assert_eq!(SignalKind::Counter.class(), SignalClass::Metric);
        assert_eq!(SignalKind::Gauge.class(), SignalClass::Metric);
        assert_eq!(SignalKind::Histogram.class(), SignalClass::Metric);
        assert_eq!(SignalKind::Event.class(), SignalClass::Event);
    }

    #[test]
    fn test_panel_weight() {
        assert_eq!(SignalKind::Log.panel_weight(), 1);
        assert_eq!(SignalKind::Counter.panel_weight(), 1);
        assert_eq!(SignalKind::Gauge.panel_weight(), 1);
        assert_eq!(SignalKind::Histogram.panel_weight(), 3);
        assert_eq!(SignalKind::Event.panel_weight(), 1);
    }

    #[test]
    fn test_class_display() {
        assert_eq!(SignalClass::Log.to_string(), "log");
        assert_eq!(SignalClass::Metric.to_string(), "metric");
        assert_eq!(SignalClass::Event.to_string(), "event");
    }

    #[test]
    fn test_signal_builder() {
        let signal = RawSignal::new(SignalKind::Log, "user_logged_in", "/app/api/sessions.rb")
            .with_defining_class("SessionsController")
            .with_inheritance_depth(2)
            .with_confidence(Confidence::Low)
            .with_metadata("level", serde_json::json!("info"));

        assert_eq!(signal.defining_class, "SessionsController");
        assert_eq!(signal.inheritance_depth, 2);
        assert_eq!(signal.confidence, Confidence::Low);
        assert_eq!(signal.metadata.get("level"), Some(&serde_json::json!("info")));
    }

    #[test]
    fn test_signal_serialization() {
        let signal = RawSignal::new(SignalKind::Histogram, "request_duration", "app/api/base.rb");
        let json = serde_json::to_string(&signal).unwrap();

        assert!(json.contains("\"kind\":\"histogram\""));
        assert!(json.contains("\"name\":\"request_duration\""));
        assert!(json.contains("\"confidence\":\"high\""));
    }

    #[test]
    fn test_signal_deserialization_defaults() {
        let json = r#"{
            "kind": "log",
            "source_file": "app/api/base.rb"
        }"#;

        let signal: RawSignal = serde_json::from_str(json).unwrap();

        assert_eq!(signal.kind, SignalKind::Log);
        assert!(signal.name.is_empty());
        assert!(signal.defining_class.is_empty());
        assert_eq!(signal.inheritance_depth, 0);
        assert_eq!(signal.confidence, Confidence::High);
        assert!(signal.metadata.is_empty());
    }

    #[test]
    fn test_dynamic_metric_serialization() {
        let metric = DynamicMetric {
            name_expression: "\"orders_\" + status".to_string(),
            source_file: "app/models/order.rb".to_string(),
            line: Some(42),
        };

        let json = serde_json::to_string(&metric).unwrap();
        assert!(json.contains("\"line\":42"));

        let no_line = DynamicMetric { line: None, ..metric };
        let json = serde_json::to_string(&no_line).unwrap();
        assert!(!json.contains("line"));
    }
}
