//! Per-channel biomarker evaluation.
//!
//! Classifies a reading against its warning/critical limits and attaches a
//! templated interpretation, optionally annotated with a trend note when a
//! personal baseline is known.

use crate::analysis::baseline::Baselines;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AppThresholds, BiomarkerInsight, BiomarkerStatus, Channel, SensorReadings, ThresholdConfig,
};
use tracing::debug;

/// Percentage above baseline that counts as a spike.
const SPIKE_PCT: f64 = 50.0;

/// Percentage above baseline that is noted on otherwise normal values.
const BASELINE_NOTE_PCT: f64 = 25.0;

/// Interpretation text for each status of a channel.
#[derive(Debug, Clone, Copy)]
pub struct Descriptions {
    pub normal: &'static str,
    pub elevated: &'static str,
    pub critical: &'static str,
}

impl Descriptions {
    pub fn for_status(&self, status: BiomarkerStatus) -> &'static str {
        match status {
            BiomarkerStatus::Normal => self.normal,
            BiomarkerStatus::Elevated => self.elevated,
            BiomarkerStatus::Critical => self.critical,
        }
    }
}

/// Clinical description templates for a channel.
pub fn descriptions(channel: Channel) -> Descriptions {
    let (normal, elevated, critical) = match channel {
        Channel::Acetone => (
            "Healthy lipid metabolism.",
            "Lipolysis detected. Potential fasting or pre-diabetes.",
            "High volatility. Risk of Ketoacidosis (DKA).",
        ),
        Channel::Ammonia => (
            "Normal urea cycle.",
            "Protein metabolism imbalance / early hepatic stress.",
            "Toxic levels. Severe liver/kidney dysfunction risk.",
        ),
        Channel::Sulfur => (
            "No bacterial overgrowth.",
            "VSCs present. Suggests oral/throat infection.",
            "High VSCs. Indicator of H. pylori or periodontal disease.",
        ),
        Channel::Ethanol => (
            "No alcohol metabolites.",
            "Trace metabolites (Fermentation/Ingestion).",
            "High toxicity. Intoxication or Auto-Brewery Syndrome.",
        ),
        Channel::Ether => (
            "No chemical traces detected.",
            "Trace exposure. Check environment for solvents.",
            "Dangerous exposure levels. Respiratory risk.",
        ),
        Channel::Hydrogen => (
            "Normal gut fermentation.",
            "Rapid carbohydrate fermentation in small intestine.",
            "Strong indicator of SIBO (Hydrogen-dominant).",
        ),
        Channel::Methane => (
            "Normal archaea activity.",
            "Slowed transit time indicated.",
            "Strong indicator of SIBO (Methane-dominant) / IMO.",
        ),
        Channel::Isoprene => (
            "Normal cholesterol synthesis.",
            "Elevated metabolic stress or cholesterol synthesis.",
            "High oxidative stress. Potential severe sleep apnea indicator.",
        ),
        Channel::CarbonMonoxide => (
            "Normal environmental levels.",
            "Exposure detected (Passive smoke / City pollution).",
            "Toxic exposure. Potential localized combustion leak.",
        ),
        Channel::NitricOxide => (
            "Healthy airway inflammation levels.",
            "Mild airway inflammation detected.",
            "Severe airway inflammation. Strong asthma/allergy indicator.",
        ),
    };

    Descriptions {
        normal,
        elevated,
        critical,
    }
}

/// Classifies a value. Values exactly at a bound are not escalated.
pub fn classify(value: f64, thresholds: &ThresholdConfig) -> BiomarkerStatus {
    if value > thresholds.critical {
        BiomarkerStatus::Critical
    } else if value > thresholds.warning {
        BiomarkerStatus::Elevated
    } else {
        BiomarkerStatus::Normal
    }
}

/// Builds the trend annotation for a value relative to its baseline.
///
/// Returns `None` without a usable (positive) baseline or when the change
/// is not significant.
pub fn trend_note(value: f64, baseline: Option<f64>, status: BiomarkerStatus) -> Option<String> {
    let avg = baseline.filter(|avg| *avg > 0.0)?;
    let pct_change = (value - avg) / avg * 100.0;

    if pct_change > SPIKE_PCT {
        Some(format!(
            " TREND ALERT: Significant spike (+{:.0}%) compared to history.",
            pct_change
        ))
    } else if pct_change > BASELINE_NOTE_PCT && status == BiomarkerStatus::Normal {
        Some(format!(
            " NOTE: Value is {:.0}% higher than your personal baseline.",
            pct_change
        ))
    } else {
        None
    }
}

/// Evaluates one channel into an insight.
pub fn evaluate(
    channel: Channel,
    value: f64,
    thresholds: &ThresholdConfig,
    descriptions: &Descriptions,
    baseline: Option<f64>,
) -> EngineResult<BiomarkerInsight> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::invalid_reading(channel.key(), value));
    }
    thresholds.validate(channel)?;

    let status = classify(value, thresholds);
    let mut interpretation = descriptions.for_status(status).to_string();

    if let Some(note) = trend_note(value, baseline, status) {
        interpretation.push_str(&note);
    }

    debug!(
        "{}: {:.2} {} -> {} (baseline: {:?})",
        channel,
        value,
        channel.unit(),
        status,
        baseline
    );

    Ok(BiomarkerInsight {
        name: channel.display_name().to_string(),
        value,
        unit: channel.unit().to_string(),
        status,
        interpretation,
    })
}

/// Evaluates every monitored channel of a snapshot, in channel order.
///
/// Fails on the first invalid reading or missing threshold.
pub fn evaluate_all(
    readings: &SensorReadings,
    thresholds: &AppThresholds,
    baselines: Option<&Baselines>,
) -> EngineResult<Vec<BiomarkerInsight>> {
    for (name, value) in [
        ("temperature", readings.temperature),
        ("humidity", readings.humidity),
    ] {
        if !value.is_finite() {
            return Err(EngineError::invalid_reading(name, value));
        }
    }

    Channel::ALL
        .into_iter()
        .map(|channel| {
            let config = thresholds.require(channel)?;
            let baseline = baselines.and_then(|b| b.get(channel.display_name()).copied());
            evaluate(
                channel,
                readings.value(channel),
                config,
                &descriptions(channel),
                baseline,
            )
        })
        .collect()
}
