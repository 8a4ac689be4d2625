//! Pipeline orchestration.
//!
//! Wires the limit engine, the assembler, and a renderer into the
//! signal-to-dashboard run loop. The pipeline is synchronous, performs
//! no I/O, and holds no state between runs: identical input always
//! produces an identical bundle and dashboard.

use crate::assemble;
use crate::limits::{LimitEngine, LimitError, LimitMode};
use crate::models::{Bundle, ChangeSet, DetectorReport, DynamicMetric, RawSignal, TimeRange};
use crate::render::{DashboardRenderer, GrafanaRenderer};

/// The result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput<O> {
    /// The vendor-neutral query bundle.
    pub bundle: Bundle,
    /// The rendered dashboard document.
    pub dashboard: O,
}

/// The signal-to-dashboard pipeline.
///
/// # Example
///
/// ```
/// use shared::limits::LimitMode;
/// use shared::models::{ChangeSet, RawSignal, SignalKind, TimeRange};
/// use shared::pipeline::DashboardPipeline;
///
/// let pipeline = DashboardPipeline::grafana(LimitMode::Lenient);
/// let signals = vec![RawSignal::new(SignalKind::Log, "hello", "app/api/base.rb")];
/// let output = pipeline
///     .run(ChangeSet::new("feature/hello"), signals, Vec::new(), TimeRange::default())
///     .unwrap();
///
/// assert_eq!(output.bundle.logs.len(), 1);
/// assert_eq!(output.dashboard.panels.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DashboardPipeline<R = GrafanaRenderer> {
    engine: LimitEngine,
    renderer: R,
}

impl DashboardPipeline<GrafanaRenderer> {
    /// Creates a pipeline rendering Grafana dashboards with the default
    /// limit policy.
    #[must_use]
    pub fn grafana(mode: LimitMode) -> Self {
        Self::new(LimitEngine::new(mode), GrafanaRenderer::new())
    }
}

impl<R: DashboardRenderer> DashboardPipeline<R> {
    /// Creates a pipeline from an engine and a renderer.
    #[must_use]
    pub fn new(engine: LimitEngine, renderer: R) -> Self {
        Self { engine, renderer }
    }

    /// Runs the full pipeline: limit enforcement, bundle assembly, and
    /// rendering.
    ///
    /// # Errors
    ///
    /// In strict mode, returns the [`LimitError`] of the first violated
    /// budget. Lenient mode never fails; truncation warnings end up in
    /// the bundle metadata.
    pub fn run(
        &self,
        change_set: ChangeSet,
        signals: Vec<RawSignal>,
        dynamic_metrics: Vec<DynamicMetric>,
        time_range: TimeRange,
    ) -> Result<PipelineOutput<R::Output>, LimitError> {
        tracing::debug!(signals = signals.len(), branch = %change_set.branch, "Applying limit policy");
        let truncation = self.engine.truncate_and_validate(signals)?;
        for warning in &truncation.warnings {
            tracing::warn!(%warning, "Signals truncated");
        }

        let bundle = assemble::assemble(
            change_set,
            &truncation.signals,
            time_range,
            dynamic_metrics,
            truncation.warnings,
        );
        tracing::debug!(
            logs = bundle.logs.len(),
            metrics = bundle.metrics.len(),
            dynamic_metrics = bundle.metadata.dynamic_metrics.len(),
            "Assembled query bundle"
        );

        let dashboard = self.renderer.render(&bundle);
        Ok(PipelineOutput { bundle, dashboard })
    }

    /// Runs the pipeline on a full detector report, falling back to the
    /// default time range when the report carries none.
    ///
    /// # Errors
    ///
    /// Same as [`DashboardPipeline::run`].
    pub fn run_report(
        &self,
        report: DetectorReport,
    ) -> Result<PipelineOutput<R::Output>, LimitError> {
        let time_range = report.time_range.unwrap_or_default();
        self.run(
            report.change_set,
            report.signals,
            report.dynamic_metrics,
            time_range,
        )
    }
}
