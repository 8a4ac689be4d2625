//! Grafana dashboard renderer.
//!
//! Emits a Grafana-style JSON document from a query bundle: one panel
//! per log, counter, and gauge query, three percentile panels per
//! histogram query, and a single text panel when the bundle is empty.
//! Panel IDs and grid positions are assigned deterministically so a
//! fixed bundle always renders to the same document.

use serde::{Deserialize, Serialize};

use super::{
    escape_line_filter, relative_source_path, sanitize_metric_name, truncate_title,
    DashboardRenderer,
};
use crate::models::{Bundle, Query, TimeRange};
use crate::normalize::METRIC_TYPE_KEY;

/// Maximum panel title length, ellipsis included.
const TITLE_MAX: usize = 30;

/// The percentile panels a histogram query expands into.
const PERCENTILES: [(&str, &str); 3] = [("p50", "0.50"), ("p95", "0.95"), ("p99", "0.99")];

/// Panel position on the 24-unit-wide dashboard grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    /// Column offset.
    pub x: u32,
    /// Row offset.
    pub y: u32,
    /// Panel width.
    pub w: u32,
    /// Panel height.
    pub h: u32,
}

/// One data query inside a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Name of the datasource the expression runs against.
    pub datasource: String,

    /// The query expression.
    pub expr: String,

    /// Legend template for the series this target produces.
    #[serde(rename = "legendFormat", skip_serializing_if = "Option::is_none")]
    pub legend_format: Option<String>,

    /// Target identifier within the panel.
    #[serde(rename = "refId")]
    pub ref_id: String,
}

/// Options block for text panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOptions {
    /// Content rendering mode.
    pub mode: String,
    /// The text content.
    pub content: String,
}

/// One dashboard panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    /// Panel ID, unique within the dashboard, assigned sequentially
    /// from 1.
    pub id: u64,

    /// Panel type ("logs", "timeseries", "text").
    #[serde(rename = "type")]
    pub panel_type: String,

    /// Panel title.
    pub title: String,

    /// Panel description citing the defining class and source location.
    pub description: String,

    /// Position on the dashboard grid.
    #[serde(rename = "gridPos")]
    pub grid_pos: GridPos,

    /// Data queries backing the panel. Empty for text panels.
    pub targets: Vec<Target>,

    /// Text-panel options; absent on data panels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<TextOptions>,
}

/// A ready-to-import Grafana dashboard document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrafanaDashboard {
    /// Dashboard title.
    pub title: String,

    /// Dashboard tags.
    pub tags: Vec<String>,

    /// The time range the dashboard opens with.
    pub time: TimeRange,

    /// All panels, in ID order.
    pub panels: Vec<Panel>,

    /// Grafana dashboard schema version.
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
}

/// Renders a bundle into a Grafana dashboard.
///
/// Panel order is the bundle's lane order: all log panels first, then
/// metric panels, a histogram expanding into three consecutive IDs.
/// Data panels tile left to right, three 8x8 panels per row.
#[derive(Debug, Clone)]
pub struct GrafanaRenderer {
    logs_datasource: String,
    metrics_datasource: String,
}

impl Default for GrafanaRenderer {
    fn default() -> Self {
        Self {
            logs_datasource: "Loki".to_string(),
            metrics_datasource: "Prometheus".to_string(),
        }
    }
}

impl GrafanaRenderer {
    /// Creates a renderer with the default datasource names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the datasource names panels refer to.
    #[must_use]
    pub fn with_datasources(
        mut self,
        logs: impl Into<String>,
        metrics: impl Into<String>,
    ) -> Self {
        self.logs_datasource = logs.into();
        self.metrics_datasource = metrics.into();
        self
    }

    fn log_panel(&self, query: &Query, id: u64, slot: usize) -> Panel {
        let mut expr = "{service=\"$service\"}".to_string();
        if !query.name.is_empty() {
            expr.push_str(&format!(" |= \"{}\"", escape_line_filter(&query.name)));
        }

        Panel {
            id,
            panel_type: "logs".to_string(),
            title: truncate_title(&query.name, TITLE_MAX),
            description: describe("Log", query),
            grid_pos: grid_pos(slot),
            targets: vec![Target {
                datasource: self.logs_datasource.clone(),
                expr,
                legend_format: None,
                ref_id: "A".to_string(),
            }],
            options: None,
        }
    }

    fn counter_panel(&self, query: &Query, id: u64, slot: usize) -> Panel {
        let name = sanitize_metric_name(&query.name);
        self.timeseries_panel(
            id,
            slot,
            truncate_title(&query.name, TITLE_MAX),
            describe("Counter", query),
            format!("sum(rate({name}[5m])) by (service)"),
            "{{service}}",
        )
    }

    fn gauge_panel(&self, query: &Query, id: u64, slot: usize) -> Panel {
        let name = sanitize_metric_name(&query.name);
        self.timeseries_panel(
            id,
            slot,
            truncate_title(&query.name, TITLE_MAX),
            describe("Gauge", query),
            format!("{name}{{service=\"$service\", env=\"$env\"}}"),
            "{{instance}}",
        )
    }

    fn histogram_panel(
        &self,
        query: &Query,
        id: u64,
        slot: usize,
        percentile: &str,
        quantile: &str,
    ) -> Panel {
        let name = sanitize_metric_name(&query.name);
        self.timeseries_panel(
            id,
            slot,
            format!("{} ({percentile})", truncate_title(&query.name, TITLE_MAX)),
            describe(&format!("Histogram {percentile}"), query),
            format!("histogram_quantile({quantile}, sum(rate({name}_bucket[5m])) by (le, service))"),
            "{{service}}",
        )
    }

    fn timeseries_panel(
        &self,
        id: u64,
        slot: usize,
        title: String,
        description: String,
        expr: String,
        legend: &str,
    ) -> Panel {
        Panel {
            id,
            panel_type: "timeseries".to_string(),
            title,
            description,
            grid_pos: grid_pos(slot),
            targets: vec![Target {
                datasource: self.metrics_datasource.clone(),
                expr,
                legend_format: Some(legend.to_string()),
                ref_id: "A".to_string(),
            }],
            options: None,
        }
    }

    fn placeholder_panel() -> Panel {
        Panel {
            id: 1,
            panel_type: "text".to_string(),
            title: "No Signals Detected".to_string(),
            description: String::new(),
            grid_pos: GridPos {
                x: 0,
                y: 0,
                w: 24,
                h: 6,
            },
            targets: Vec::new(),
            options: Some(TextOptions {
                mode: "markdown".to_string(),
                content: "No observability signals were detected in this change set.".to_string(),
            }),
        }
    }
}

impl DashboardRenderer for GrafanaRenderer {
    type Output = GrafanaDashboard;

    fn render(&self, bundle: &Bundle) -> GrafanaDashboard {
        let mut panels = Vec::new();

        if bundle.is_empty() {
            panels.push(Self::placeholder_panel());
        } else {
            let mut id: u64 = 0;
            let mut slot: usize = 0;

            for query in &bundle.logs {
                id += 1;
                panels.push(self.log_panel(query, id, slot));
                slot += 1;
            }
            for query in &bundle.metrics {
                match query.metadata_str(METRIC_TYPE_KEY) {
                    Some("histogram") => {
                        for (percentile, quantile) in PERCENTILES {
                            id += 1;
                            panels.push(self.histogram_panel(query, id, slot, percentile, quantile));
                            slot += 1;
                        }
                    }
                    Some("gauge") => {
                        id += 1;
                        panels.push(self.gauge_panel(query, id, slot));
                        slot += 1;
                    }
                    // Counters, and the safe fallback for queries with
                    // missing or unrecognized metric metadata.
                    _ => {
                        id += 1;
                        panels.push(self.counter_panel(query, id, slot));
                        slot += 1;
                    }
                }
            }
        }

        GrafanaDashboard {
            title: dashboard_title(bundle),
            tags: vec!["pulseboard".to_string(), "pr-dashboard".to_string()],
            time: bundle.metadata.time_range.clone(),
            panels,
            schema_version: 36,
        }
    }
}

/// Three 8-unit panels per row on the 24-unit grid.
fn grid_pos(slot: usize) -> GridPos {
    let slot = u32::try_from(slot).unwrap_or(u32::MAX);
    GridPos {
        x: (slot % 3) * 8,
        y: (slot / 3) * 8,
        w: 8,
        h: 8,
    }
}

/// Panel description citing the defining class and the de-prefixed
/// source location, with the line number when the detector recorded
/// one.
fn describe(what: &str, query: &Query) -> String {
    let location = relative_source_path(&query.source_file);
    match query.metadata_u64("line") {
        Some(line) => format!("{what} from {} ({location}:{line})", query.defining_class),
        None => format!("{what} from {} ({location})", query.defining_class),
    }
}

fn dashboard_title(bundle: &Bundle) -> String {
    let branch = &bundle.metadata.change_set.branch;
    if branch.is_empty() {
        "PR Dashboard".to_string()
    } else {
        format!("PR Dashboard: {branch}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::models::{ChangeSet, RawSignal, SignalKind};

    fn bundle_of(signals: Vec<RawSignal>) -> Bundle {
        assemble(
            ChangeSet::new("feature/checkout"),
            &signals,
            TimeRange::default(),
            Vec::new(),
            Vec::new(),
        )
    }

    fn render(signals: Vec<RawSignal>) -> GrafanaDashboard {
        GrafanaRenderer::new().render(&bundle_of(signals))
    }

    #[test]
    fn test_empty_bundle_renders_placeholder() {
        let dashboard = render(Vec::new());

        assert_eq!(dashboard.panels.len(), 1);
        let panel = &dashboard.panels[0];
        assert_eq!(panel.panel_type, "text");
        assert_eq!(panel.title, "No Signals Detected");
        assert!(panel.targets.is_empty());
        assert_eq!(panel.options.as_ref().unwrap().mode, "markdown");
    }

    #[test]
    fn test_log_panel_expression() {
        let dashboard = render(vec![
            RawSignal::new(SignalKind::Log, "user_logged_in", "/app/api/sessions.rb")
                .with_defining_class("SessionsController"),
        ]);

        let panel = &dashboard.panels[0];
        assert_eq!(panel.panel_type, "logs");
        assert_eq!(
            panel.targets[0].expr,
            "{service=\"$service\"} |= \"user_logged_in\""
        );
        assert_eq!(panel.targets[0].datasource, "Loki");
        assert_eq!(
            panel.description,
            "Log from SessionsController (app/api/sessions.rb)"
        );
    }

    #[test]
    fn test_log_panel_escapes_quotes_in_name() {
        let dashboard = render(vec![RawSignal::new(
            SignalKind::Log,
            r#"payment "declined""#,
            "app/models/payment.rb",
        )]);

        assert_eq!(
            dashboard.panels[0].targets[0].expr,
            r#"{service="$service"} |= "payment \"declined\"""#
        );
    }

    #[test]
    fn test_log_panel_with_empty_name_has_no_text_filter() {
        let dashboard = render(vec![RawSignal::new(SignalKind::Log, "", "app/api/base.rb")]);

        assert_eq!(dashboard.panels[0].targets[0].expr, "{service=\"$service\"}");
        assert_eq!(dashboard.panels[0].title, "");
    }

    #[test]
    fn test_counter_panel_sanitizes_name() {
        let dashboard = render(vec![
            RawSignal::new(SignalKind::Counter, "orders.created!", "app/models/order.rb"),
        ]);

        let target = &dashboard.panels[0].targets[0];
        assert_eq!(target.expr, "sum(rate(orders_created_[5m])) by (service)");
        assert_eq!(target.legend_format.as_deref(), Some("{{service}}"));
        assert_eq!(target.datasource, "Prometheus");
    }

    #[test]
    fn test_gauge_panel_expression() {
        let dashboard = render(vec![
            RawSignal::new(SignalKind::Gauge, "queue_depth", "app/workers/worker.rb"),
        ]);

        let target = &dashboard.panels[0].targets[0];
        assert_eq!(target.expr, "queue_depth{service=\"$service\", env=\"$env\"}");
        assert_eq!(target.legend_format.as_deref(), Some("{{instance}}"));
    }

    #[test]
    fn test_histogram_expands_to_three_panels() {
        let dashboard = render(vec![
            RawSignal::new(SignalKind::Histogram, "request.duration", "app/api/base.rb"),
        ]);

        assert_eq!(dashboard.panels.len(), 3);
        let titles: Vec<_> = dashboard.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "request.duration (p50)",
                "request.duration (p95)",
                "request.duration (p99)"
            ]
        );
        assert_eq!(
            dashboard.panels[1].targets[0].expr,
            "histogram_quantile(0.95, sum(rate(request_duration_bucket[5m])) by (le, service))"
        );

        // Three panels tile one full row.
        let positions: Vec<_> = dashboard.panels.iter().map(|p| (p.grid_pos.x, p.grid_pos.y)).collect();
        assert_eq!(positions, vec![(0, 0), (8, 0), (16, 0)]);
    }

    #[test]
    fn test_panel_ids_are_sequential_logs_first() {
        let dashboard = render(vec![
            RawSignal::new(SignalKind::Counter, "orders_created", "app/models/order.rb"),
            RawSignal::new(SignalKind::Log, "order_failed", "app/models/order.rb"),
            RawSignal::new(SignalKind::Histogram, "checkout_duration", "app/models/order.rb"),
        ]);

        let ids: Vec<_> = dashboard.panels.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        // Log panel first, then the metrics in bundle order.
        assert_eq!(dashboard.panels[0].panel_type, "logs");
        assert_eq!(dashboard.panels[1].title, "orders_created");
        assert_eq!(dashboard.panels[2].title, "checkout_duration (p50)");
    }

    #[test]
    fn test_grid_wraps_every_three_panels() {
        let signals: Vec<_> = (0..4)
            .map(|i| RawSignal::new(SignalKind::Log, format!("log_{i}"), "app/api/base.rb"))
            .collect();
        let dashboard = render(signals);

        assert_eq!(dashboard.panels[3].grid_pos, GridPos { x: 0, y: 8, w: 8, h: 8 });
    }

    #[test]
    fn test_title_truncation() {
        let dashboard = render(vec![RawSignal::new(
            SignalKind::Log,
            "a_very_long_signal_name_that_keeps_going",
            "app/api/base.rb",
        )]);

        assert_eq!(dashboard.panels[0].title, "a_very_long_signal_name_tha...");
    }

    #[test]
    fn test_line_metadata_lands_in_description() {
        let dashboard = render(vec![
            RawSignal::new(SignalKind::Log, "hello", "/app/api/v1/base.rb")
                .with_defining_class("V1::Base")
                .with_metadata("line", serde_json::json!(42)),
        ]);

        assert_eq!(
            dashboard.panels[0].description,
            "Log from V1::Base (app/api/v1/base.rb:42)"
        );
    }

    #[test]
    fn test_missing_metric_type_falls_back_to_counter_template() {
        let mut bundle = bundle_of(vec![RawSignal::new(
            SignalKind::Counter,
            "orders_created",
            "app/models/order.rb",
        )]);
        bundle.metrics[0].metadata.clear();

        let dashboard = GrafanaRenderer::new().render(&bundle);
        assert_eq!(
            dashboard.panels[0].targets[0].expr,
            "sum(rate(orders_created[5m])) by (service)"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let bundle = bundle_of(vec![
            RawSignal::new(SignalKind::Log, "order_failed", "app/models/order.rb"),
            RawSignal::new(SignalKind::Histogram, "checkout_duration", "app/models/order.rb"),
        ]);
        let renderer = GrafanaRenderer::new();

        assert_eq!(renderer.render(&bundle), renderer.render(&bundle));
    }

    #[test]
    fn test_dashboard_header() {
        let dashboard = render(Vec::new());

        assert_eq!(dashboard.title, "PR Dashboard: feature/checkout");
        assert_eq!(dashboard.tags, vec!["pulseboard", "pr-dashboard"]);
        assert_eq!(dashboard.time, TimeRange::default());
        assert_eq!(dashboard.schema_version, 36);
    }

    #[test]
    fn test_custom_datasources() {
        let renderer = GrafanaRenderer::new().with_datasources("logs-eu", "prom-eu");
        let dashboard = renderer.render(&bundle_of(vec![
            RawSignal::new(SignalKind::Log, "hello", "app/api/base.rb"),
            RawSignal::new(SignalKind::Counter, "orders", "app/models/order.rb"),
        ]));

        assert_eq!(dashboard.panels[0].targets[0].datasource, "logs-eu");
        assert_eq!(dashboard.panels[1].targets[0].datasource, "prom-eu");
    }
}
