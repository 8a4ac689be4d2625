//! Dashboard rendering.
//!
//! Renderers translate a [`Bundle`] into a backend-specific dashboard
//! document. The limit engine and assembler never see the backend, so
//! renderers can be swapped freely; the only implemented backend emits
//! Grafana-style JSON.

pub mod grafana;

pub use grafana::{GrafanaDashboard, GrafanaRenderer, GridPos, Panel, Target, TextOptions};

use crate::models::Bundle;

/// Translates a bundle into a dashboard document.
///
/// Implementations must be deterministic: rendering the same bundle
/// twice yields identical output, with no hidden counters or
/// timestamps beyond what the bundle supplies.
pub trait DashboardRenderer {
    /// The dashboard document type this backend produces.
    type Output: serde::Serialize;

    /// Renders the bundle into a dashboard document.
    fn render(&self, bundle: &Bundle) -> Self::Output;
}

/// Replaces every character outside `[A-Za-z0-9_:]` with `_` so a
/// detected metric name is safe to embed in a Prometheus-style query
/// expression.
#[must_use]
pub fn sanitize_metric_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Truncates a panel title to `max` characters, ending in `...` when
/// anything was cut.
#[must_use]
pub fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Escapes backslashes and double quotes so a detected log name is
/// safe to embed in a quoted log line filter.
#[must_use]
pub fn escape_line_filter(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// De-prefixes a source path to its first `app/` or `lib/` segment, so
/// panel descriptions cite repository-relative paths regardless of
/// where the detector ran.
#[must_use]
pub fn relative_source_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    if let Some(index) = segments.iter().position(|s| *s == "app" || *s == "lib") {
        segments[index..].join("/")
    } else {
        path.trim_start_matches('/').to_string()
    }
}
