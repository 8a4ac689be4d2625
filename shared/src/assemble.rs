//! Bundle assembly.
//!
//! Turns the surviving signal list into a [`Bundle`]: normalize each
//! signal, split the queries into lanes, pack the metadata. No
//! filtering logic lives here; the limit engine has already decided
//! what survives.

use crate::models::{
    Bundle, BundleMetadata, ChangeSet, DynamicMetric, QueryType, RawSignal, TimeRange,
};
use crate::normalize;

/// Assembles a bundle from the surviving signals of one run.
///
/// Lane order follows signal order, so identical input always produces
/// an identical bundle. The trace lane is always empty.
#[must_use]
pub fn assemble(
    change_set: ChangeSet,
    signals: &[RawSignal],
    time_range: TimeRange,
    dynamic_metrics: Vec<DynamicMetric>,
    warnings: Vec<String>,
) -> Bundle {
    let mut logs = Vec::new();
    let mut metrics = Vec::new();
    for signal in signals {
        let Some(query) = normalize::normalize(signal, &time_range) else {
            continue;
        };
        match query.query_type {
            QueryType::Logs => logs.push(query),
            QueryType::Metrics => metrics.push(query),
            QueryType::Traces => {}
        }
    }

    Bundle {
        logs,
        metrics,
        traces: Vec::new(),
        metadata: BundleMetadata {
            change_set,
            time_range,
            dynamic_metrics,
            limit_warnings: warnings,
        },
    }
}
