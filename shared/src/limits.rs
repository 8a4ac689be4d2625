//! Signal limit engine.
//!
//! Decides which detected signals survive before a dashboard is built.
//! Two operating modes share the same counting and weighting logic:
//! lenient mode truncates and records warnings so a PR always gets *a*
//! dashboard, strict mode fails at the first violation so an oversized
//! dashboard can block instead of silently degrading.
//!
//! Warning and error wording below is surfaced verbatim to CI logs and
//! PR comments; it is an external contract.

use thiserror::Error;

use crate::models::{RawSignal, SignalClass, SignalKind};

/// Check order for the budget classes. Also the order in which strict
/// mode reports the first violation and lenient mode records warnings.
const CLASS_ORDER: [SignalClass; 3] = [SignalClass::Log, SignalClass::Metric, SignalClass::Event];

/// Per-class and total-panel budgets.
///
/// The defaults are the fixed limit policy: 10 logs, 10 metrics,
/// 5 events, 12 panels. The numbers appear verbatim in warning and
/// error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    /// Maximum number of log signals.
    pub max_logs: usize,
    /// Maximum number of metric signals (counters, gauges, histograms).
    pub max_metrics: usize,
    /// Maximum number of event signals.
    pub max_events: usize,
    /// Maximum total panel weight across all surviving signals.
    pub max_panels: usize,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            max_logs: 10,
            max_metrics: 10,
            max_events: 5,
            max_panels: 12,
        }
    }
}

impl LimitPolicy {
    /// Returns the budget for one signal class.
    #[must_use]
    pub fn max_for(&self, class: SignalClass) -> usize {
        match class {
            SignalClass::Log => self.max_logs,
            SignalClass::Metric => self.max_metrics,
            SignalClass::Event => self.max_events,
        }
    }
}

/// How the engine reacts to a limit violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitMode {
    /// Truncate the signal list and record warnings.
    #[default]
    Lenient,
    /// Fail at the first violation without truncating.
    Strict,
}

/// Which limit a strict-mode violation hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// The log-count limit.
    Logs,
    /// The metric-count limit.
    Metrics,
    /// The event-count limit.
    Events,
    /// The total panel-weight limit.
    Panels,
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logs => write!(f, "Logs"),
            Self::Metrics => write!(f, "Metrics"),
            Self::Events => write!(f, "Events"),
            Self::Panels => write!(f, "Panel"),
        }
    }
}

impl From<SignalClass> for LimitKind {
    fn from(class: SignalClass) -> Self {
        match class {
            SignalClass::Log => Self::Logs,
            SignalClass::Metric => Self::Metrics,
            SignalClass::Event => Self::Events,
        }
    }
}

/// A strict-mode limit violation.
///
/// The three-line `Display` output is part of the external contract:
/// the violated limit with observed and allowed counts, a breakdown of
/// the whole signal list, and the defining class contributing the most
/// signals to the offending bucket (ties broken by first encounter in
/// detection order).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} limit exceeded: found {found}, max allowed {max}\nBreakdown: {logs} logs, {metrics} metrics, {events} events\nTop contributor: {top_class} ({top_count} signals)")]
pub struct LimitError {
    /// Which limit was violated.
    pub kind: LimitKind,
    /// The observed count (signals for class limits, panel weight for
    /// the panel limit).
    pub found: usize,
    /// The configured maximum.
    pub max: usize,
    /// Total log signals in the input.
    pub logs: usize,
    /// Total metric signals in the input.
    pub metrics: usize,
    /// Total event signals in the input.
    pub events: usize,
    /// The defining class with the most signals in the offending bucket.
    pub top_class: String,
    /// How many signals that class contributed.
    pub top_count: usize,
}

/// The lenient-mode result: surviving signals plus truncation warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Truncation {
    /// Signals that survived both passes, in original detection order.
    pub signals: Vec<RawSignal>,
    /// Human-readable warnings, one per affected class per pass.
    pub warnings: Vec<String>,
}

/// Signal counts per budget class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ClassCounts {
    logs: usize,
    metrics: usize,
    events: usize,
}

impl ClassCounts {
    fn tally(signals: &[RawSignal]) -> Self {
        let mut counts = Self::default();
        for signal in signals {
            counts.increment(signal.kind.class());
        }
        counts
    }

    fn get(&self, class: SignalClass) -> usize {
        match class {
            SignalClass::Log => self.logs,
            SignalClass::Metric => self.metrics,
            SignalClass::Event => self.events,
        }
    }

    fn increment(&mut self, class: SignalClass) {
        match class {
            SignalClass::Log => self.logs += 1,
            SignalClass::Metric => self.metrics += 1,
            SignalClass::Event => self.events += 1,
        }
    }
}

/// Enforces the limit policy on a detected signal list.
#[derive(Debug, Clone, Default)]
pub struct LimitEngine {
    policy: LimitPolicy,
    mode: LimitMode,
}

impl LimitEngine {
    /// Creates an engine with the default policy.
    #[must_use]
    pub fn new(mode: LimitMode) -> Self {
        Self {
            policy: LimitPolicy::default(),
            mode,
        }
    }

    /// Creates an engine with an explicit policy.
    #[must_use]
    pub fn with_policy(mode: LimitMode, policy: LimitPolicy) -> Self {
        Self { policy, mode }
    }

    /// Returns the policy this engine enforces.
    #[must_use]
    pub fn policy(&self) -> &LimitPolicy {
        &self.policy
    }

    /// Applies the limit policy to a signal list.
    ///
    /// In lenient mode the list is truncated to fit every budget and
    /// the dropped counts are reported as warnings. In strict mode the
    /// list is returned untouched when every budget holds.
    ///
    /// Both passes are order-stable: surviving signals keep their
    /// relative detection order, so identical detector output always
    /// produces identical truncation.
    ///
    /// # Errors
    ///
    /// In strict mode, returns a [`LimitError`] describing the first
    /// violation: class limits checked in log, metric, event order,
    /// then the total panel weight.
    pub fn truncate_and_validate(&self, signals: Vec<RawSignal>) -> Result<Truncation, LimitError> {
        match self.mode {
            LimitMode::Lenient => Ok(self.truncate(signals)),
            LimitMode::Strict => self.validate(signals),
        }
    }

    /// Lenient path: the class-limit pass followed by the panel-weight
    /// pass.
    fn truncate(&self, signals: Vec<RawSignal>) -> Truncation {
        let mut warnings = Vec::new();

        // Class-limit pass: keep the first N of each class.
        let mut kept = ClassCounts::default();
        let mut dropped = ClassCounts::default();
        let mut survivors = Vec::with_capacity(signals.len());
        for signal in signals {
            let class = signal.kind.class();
            if kept.get(class) < self.policy.max_for(class) {
                kept.increment(class);
                survivors.push(signal);
            } else {
                dropped.increment(class);
            }
        }
        for class in CLASS_ORDER {
            let count = dropped.get(class);
            if count > 0 {
                let max = self.policy.max_for(class);
                tracing::debug!(count, %class, max, "Dropped signals over class limit");
                warnings.push(format!(
                    "{count} {class}s not added to dashboard (limit: {max})"
                ));
            }
        }

        // Panel-weight pass: remove signals one at a time, logs first,
        // then histograms, then remaining metrics, then events.
        let stages: [fn(SignalKind) -> bool; 4] = [
            |kind| matches!(kind, SignalKind::Log),
            |kind| matches!(kind, SignalKind::Histogram),
            |kind| matches!(kind, SignalKind::Counter | SignalKind::Gauge),
            |kind| matches!(kind, SignalKind::Event),
        ];
        let mut weight = total_panel_weight(&survivors);
        let mut removed = ClassCounts::default();
        for stage in stages {
            while weight > self.policy.max_panels {
                let Some(position) = survivors.iter().position(|s| stage(s.kind)) else {
                    break;
                };
                let signal = survivors.remove(position);
                weight -= signal.panel_weight();
                removed.increment(signal.kind.class());
            }
        }
        for class in CLASS_ORDER {
            let count = removed.get(class);
            if count > 0 {
                let max_panels = self.policy.max_panels;
                tracing::debug!(count, %class, max_panels, "Dropped signals over panel budget");
                warnings.push(format!(
                    "{count} {class}s not added to dashboard (panel limit: {max_panels})"
                ));
            }
        }

        Truncation {
            signals: survivors,
            warnings,
        }
    }

    /// Strict path: raise at the first violated budget.
    fn validate(&self, signals: Vec<RawSignal>) -> Result<Truncation, LimitError> {
        let counts = ClassCounts::tally(&signals);

        for class in CLASS_ORDER {
            let found = counts.get(class);
            let max = self.policy.max_for(class);
            if found > max {
                let (top_class, top_count) = top_contributor(
                    signals.iter().filter(|s| s.kind.class() == class),
                );
                return Err(LimitError {
                    kind: class.into(),
                    found,
                    max,
                    logs: counts.logs,
                    metrics: counts.metrics,
                    events: counts.events,
                    top_class,
                    top_count,
                });
            }
        }

        let weight = total_panel_weight(&signals);
        if weight > self.policy.max_panels {
            let (top_class, top_count) = top_contributor(signals.iter());
            return Err(LimitError {
                kind: LimitKind::Panels,
                found: weight,
                max: self.policy.max_panels,
                logs: counts.logs,
                metrics: counts.metrics,
                events: counts.events,
                top_class,
                top_count,
            });
        }

        Ok(Truncation {
            signals,
            warnings: Vec::new(),
        })
    }
}

/// Total panel weight of a signal list (histograms weigh 3, everything
/// else 1).
#[must_use]
pub fn total_panel_weight(signals: &[RawSignal]) -> usize {
    signals.iter().map(RawSignal::panel_weight).sum()
}

/// Returns the defining class with the most signals in `signals` and
/// its count. Ties break towards the class encountered first; an empty
/// class name is reported as `(unknown)`.
fn top_contributor<'a>(signals: impl Iterator<Item = &'a RawSignal>) -> (String, usize) {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for signal in signals {
        match counts.iter().position(|(class, _)| *class == signal.defining_class) {
            Some(i) => counts[i].1 += 1,
            None => counts.push((signal.defining_class.as_str(), 1)),
        }
    }

    let mut top: (&str, usize) = ("", 0);
    for (class, count) in counts {
        if count > top.1 {
            top = (class, count);
        }
    }

    let class = if top.0.is_empty() { "(unknown)" } else { top.0 };
    (class.to_string(), top.1)
}
