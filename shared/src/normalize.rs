//! Signal normalization.
//!
//! Maps detected signals into vendor-neutral queries. Log signals map
//! to the log lane, the three metric kinds map to the metric lane, and
//! every other kind is filtered out silently.

use crate::models::{Query, QueryType, RawSignal, SignalKind, TimeRange};

/// Metadata key renderers use to pick the panel template for a metric
/// query.
pub const METRIC_TYPE_KEY: &str = "metric_type";

/// Normalizes one detected signal into a query, or `None` when the
/// signal kind has no query lane.
///
/// Pure: no side effects, and the source file, defining class, and
/// metadata are carried over verbatim, with one exception: on metric
/// queries the `metric_type` entry is always set from the signal kind,
/// replacing any detector-supplied value. Renderers pick the panel
/// template from that entry, and the limit engine weighs signals by
/// kind; deriving both from the same field keeps a query's panel count
/// equal to the weight the engine budgeted for it.
///
/// The histogram one-to-three panel expansion does not happen here;
/// a histogram yields a single query like any other metric.
#[must_use]
pub fn normalize(signal: &RawSignal, time_range: &TimeRange) -> Option<Query> {
    let query_type = match signal.kind {
        SignalKind::Log => QueryType::Logs,
        SignalKind::Counter | SignalKind::Gauge | SignalKind::Histogram => QueryType::Metrics,
        SignalKind::Event => return None,
    };

    let mut metadata = signal.metadata.clone();
    if query_type == QueryType::Metrics {
        metadata.insert(
            METRIC_TYPE_KEY.to_string(),
            serde_json::Value::String(signal.kind.to_string()),
        );
    }

    Some(Query {
        query_type,
        name: signal.name.clone(),
        time_range: time_range.clone(),
        source_file: signal.source_file.clone(),
        defining_class: signal.defining_class.clone(),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_maps_to_log_lane() {
        let signal = RawSignal::new(SignalKind::Log, "user_logged_in", "/app/api/sessions.rb")
            .with_defining_class("SessionsController")
            .with_metadata("level", serde_json::json!("info"));

        let query = normalize(&signal, &TimeRange::default()).unwrap();

        assert_eq!(query.query_type, QueryType::Logs);
        assert_eq!(query.name, "user_logged_in");
        assert_eq!(query.source_file, "/app/api/sessions.rb");
        assert_eq!(query.defining_class, "SessionsController");
        assert_eq!(query.metadata_str("level"), Some("info"));
        assert!(query.metadata_str(METRIC_TYPE_KEY).is_none());
    }

    #[test]
    fn test_metric_kinds_map_to_metric_lane() {
        for kind in [SignalKind::Counter, SignalKind::Gauge, SignalKind::Histogram] {
            let signal = RawSignal::new(kind, "orders_created", "app/models/order.rb");
            let query = normalize(&signal, &TimeRange::default()).unwrap();

            assert_eq!(query.query_type, QueryType::Metrics);
            assert_eq!(query.metadata_str(METRIC_TYPE_KEY), Some(kind.to_string().as_str()));
        }
    }

    #[test]
    fn test_contradictory_metric_type_is_overwritten() {
        // A detector tagging a counter call as a histogram would make
        // the renderer emit three panels for a signal the limit engine
        // weighed as one; the kind wins.
        let signal = RawSignal::new(SignalKind::Counter, "orders_created", "app/models/order.rb")
            .with_metadata(METRIC_TYPE_KEY, serde_json::json!("histogram"));

        let query = normalize(&signal, &TimeRange::default()).unwrap();
        assert_eq!(query.metadata_str(METRIC_TYPE_KEY), Some("counter"));
    }

    #[test]
    fn test_event_is_filtered_silently() {
        let signal = RawSignal::new(SignalKind::Event, "order_placed", "app/models/order.rb");
        assert!(normalize(&signal, &TimeRange::default()).is_none());
    }

    #[test]
    fn test_time_range_is_attached() {
        let signal = RawSignal::new(SignalKind::Log, "hello", "app/api/base.rb");
        let range = TimeRange::new("now-1h", "now");

        let query = normalize(&signal, &range).unwrap();
        assert_eq!(query.time_range, range);
    }
}
