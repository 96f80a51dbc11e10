//! Analysis orchestration.
//!
//! The single entry point that turns a readings snapshot and symptom flags
//! into a finished report. History and threshold storage are injected
//! collaborators; everything below this layer is pure.

use crate::analysis::{baseline, composer, evaluator, scorer};
use crate::error::{EngineError, EngineResult};
use crate::models::{AnalysisReport, AppThresholds, SensorReadings, SymptomState};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Durable storage of past reports.
pub trait HistoryStore {
    /// Every stored report, unfiltered.
    fn list_all(&self) -> anyhow::Result<Vec<AnalysisReport>>;

    /// Persists a finished report.
    fn append(&self, report: &AnalysisReport) -> anyhow::Result<()>;
}

/// Source of the active threshold configuration.
pub trait ThresholdStore {
    fn current(&self) -> anyhow::Result<AppThresholds>;
}

/// A fixed threshold set is its own store.
impl ThresholdStore for AppThresholds {
    fn current(&self) -> anyhow::Result<AppThresholds> {
        Ok(self.clone())
    }
}

/// Runs the full pipeline over explicit inputs.
///
/// `history` is a snapshot taken once by the caller.
pub fn analyze(
    readings: &SensorReadings,
    symptoms: &SymptomState,
    thresholds: &AppThresholds,
    history: &[AnalysisReport],
) -> EngineResult<AnalysisReport> {
    thresholds.validate()?;

    let baselines = baseline::averages(history);
    debug!(
        "Historical baseline: {} channel(s) from {} report(s)",
        baselines.as_ref().map_or(0, |b| b.len()),
        history.len()
    );

    let insights = evaluator::evaluate_all(readings, thresholds, baselines.as_ref())?;
    let diseases = scorer::score(&insights, symptoms);
    let composed = composer::compose(&diseases, &insights, symptoms);

    let now = Utc::now();
    Ok(AnalysisReport {
        id: report_id(now),
        timestamp: now.timestamp_millis(),
        risk_level: composed.risk_level,
        summary: composed.summary,
        diseases,
        explanation: composed.explanation,
        recommendation: composed.recommendation,
        biomarker_insights: insights,
    })
}

/// `rpt-<UTC millisecond stamp>-<8 hex digits>`. The random suffix keeps
/// reports produced within the same millisecond apart.
pub fn report_id(at: DateTime<Utc>) -> String {
    format!(
        "rpt-{}-{:08x}",
        at.format("%Y%m%d%H%M%S%3f"),
        rand::random::<u32>()
    )
}

/// Pipeline bound to its history and threshold stores.
pub struct Orchestrator<'a> {
    history: &'a dyn HistoryStore,
    thresholds: &'a dyn ThresholdStore,
}

impl<'a> Orchestrator<'a> {
    pub fn new(history: &'a dyn HistoryStore, thresholds: &'a dyn ThresholdStore) -> Self {
        Self {
            history,
            thresholds,
        }
    }

    /// Reads thresholds and history once, then analyzes.
    pub fn analyze(
        &self,
        readings: &SensorReadings,
        symptoms: &SymptomState,
    ) -> EngineResult<AnalysisReport> {
        let thresholds = self
            .thresholds
            .current()
            .map_err(|e| EngineError::upstream(format!("threshold store: {:#}", e)))?;
        let history = self
            .history
            .list_all()
            .map_err(|e| EngineError::upstream(format!("history store: {:#}", e)))?;

        let report = analyze(readings, symptoms, &thresholds, &history)?;
        info!(
            "Analysis {} complete: {} risk, {} candidate(s)",
            report.id,
            report.risk_level,
            report.diseases.len()
        );
        Ok(report)
    }

    /// Appends a report to history. Failures are logged, not returned.
    pub fn record(&self, report: &AnalysisReport) {
        match self.history.append(report) {
            Ok(()) => debug!("Saved report {} to history", report.id),
            Err(e) => warn!("Failed to save report {} to history: {:#}", report.id, e),
        }
    }
}
