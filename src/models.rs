//! Data models for the breath-analysis engine.
//!
//! This module contains the core data structures shared by the sensor
//! sources, the evaluation pipeline, the history store and the report
//! renderers.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A monitored gas channel.
///
/// Declaration order is the order in which insights appear in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Acetone,
    Ammonia,
    Sulfur,
    Ethanol,
    Ether,
    Hydrogen,
    Methane,
    Isoprene,
    CarbonMonoxide,
    NitricOxide,
}

impl Channel {
    /// Every evaluated channel, in report order.
    pub const ALL: [Channel; 10] = [
        Channel::Acetone,
        Channel::Ammonia,
        Channel::Sulfur,
        Channel::Ethanol,
        Channel::Ether,
        Channel::Hydrogen,
        Channel::Methane,
        Channel::Isoprene,
        Channel::CarbonMonoxide,
        Channel::NitricOxide,
    ];

    /// Configuration key (matches the JSON/TOML field name).
    pub fn key(&self) -> &'static str {
        match self {
            Channel::Acetone => "acetone",
            Channel::Ammonia => "ammonia",
            Channel::Sulfur => "sulfur",
            Channel::Ethanol => "ethanol",
            Channel::Ether => "ether",
            Channel::Hydrogen => "hydrogen",
            Channel::Methane => "methane",
            Channel::Isoprene => "isoprene",
            Channel::CarbonMonoxide => "carbonMonoxide",
            Channel::NitricOxide => "nitricOxide",
        }
    }

    /// Looks up a channel by its configuration key (case-insensitive).
    pub fn from_key(key: &str) -> Option<Channel> {
        Channel::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(key))
    }

    /// Human-readable name used as the insight name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Channel::Acetone => "Acetone",
            Channel::Ammonia => "Ammonia",
            Channel::Sulfur => "Sulfur",
            Channel::Ethanol => "Ethanol",
            Channel::Ether => "Ether",
            Channel::Hydrogen => "Hydrogen",
            Channel::Methane => "Methane",
            Channel::Isoprene => "Isoprene",
            Channel::CarbonMonoxide => "Carbon Monoxide",
            Channel::NitricOxide => "Nitric Oxide",
        }
    }

    /// Measurement unit. Fixed per channel.
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Isoprene | Channel::NitricOxide => "ppb",
            _ => "ppm",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn missing_value() -> f64 {
    f64::NAN
}

/// One snapshot of every sensor channel.
///
/// Absent gas fields deserialize as NaN so that evaluation rejects them
/// instead of treating them as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReadings {
    #[serde(default = "missing_value")]
    pub acetone: f64,
    #[serde(default = "missing_value")]
    pub ammonia: f64,
    #[serde(default = "missing_value")]
    pub sulfur: f64,
    #[serde(default = "missing_value")]
    pub ethanol: f64,
    #[serde(default = "missing_value")]
    pub ether: f64,
    #[serde(default = "missing_value")]
    pub hydrogen: f64,
    #[serde(default = "missing_value")]
    pub methane: f64,
    /// ppb
    #[serde(default = "missing_value")]
    pub isoprene: f64,
    #[serde(default = "missing_value")]
    pub carbon_monoxide: f64,
    /// ppb
    #[serde(default = "missing_value")]
    pub nitric_oxide: f64,
    /// Celsius
    #[serde(default = "missing_value")]
    pub temperature: f64,
    /// Relative humidity, %
    #[serde(default = "missing_value")]
    pub humidity: f64,
    /// Unix milliseconds.
    #[serde(default)]
    pub timestamp: i64,
}

impl SensorReadings {
    /// Returns the value recorded for a gas channel.
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Acetone => self.acetone,
            Channel::Ammonia => self.ammonia,
            Channel::Sulfur => self.sulfur,
            Channel::Ethanol => self.ethanol,
            Channel::Ether => self.ether,
            Channel::Hydrogen => self.hydrogen,
            Channel::Methane => self.methane,
            Channel::Isoprene => self.isoprene,
            Channel::CarbonMonoxide => self.carbon_monoxide,
            Channel::NitricOxide => self.nitric_oxide,
        }
    }

    /// Builds a snapshot where every gas channel is derived from `f`.
    #[allow(dead_code)] // Fixture builder for engine tests
    pub fn from_fn(mut f: impl FnMut(Channel) -> f64, timestamp: i64) -> Self {
        Self {
            acetone: f(Channel::Acetone),
            ammonia: f(Channel::Ammonia),
            sulfur: f(Channel::Sulfur),
            ethanol: f(Channel::Ethanol),
            ether: f(Channel::Ether),
            hydrogen: f(Channel::Hydrogen),
            methane: f(Channel::Methane),
            isoprene: f(Channel::Isoprene),
            carbon_monoxide: f(Channel::CarbonMonoxide),
            nitric_oxide: f(Channel::NitricOxide),
            temperature: 36.5,
            humidity: 45.0,
            timestamp,
        }
    }
}

/// Warning/critical limits for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub warning: f64,
    pub critical: f64,
}

impl ThresholdConfig {
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }

    /// Checks `0 <= warning <= critical` with finite bounds.
    pub fn validate(&self, channel: Channel) -> EngineResult<()> {
        let ordered = self.warning.is_finite()
            && self.critical.is_finite()
            && self.warning >= 0.0
            && self.warning <= self.critical;

        if ordered {
            Ok(())
        } else {
            Err(EngineError::Configuration(format!(
                "invalid thresholds for {}: warning {} / critical {}",
                channel.key(),
                self.warning,
                self.critical
            )))
        }
    }
}

/// Thresholds for every configured channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppThresholds(BTreeMap<Channel, ThresholdConfig>);

impl Default for AppThresholds {
    fn default() -> Self {
        let defaults = [
            (Channel::Acetone, ThresholdConfig::new(1.8, 5.0)),
            (Channel::Ammonia, ThresholdConfig::new(0.8, 2.0)),
            (Channel::Sulfur, ThresholdConfig::new(0.5, 1.0)),
            (Channel::Ethanol, ThresholdConfig::new(50.0, 200.0)),
            (Channel::Ether, ThresholdConfig::new(10.0, 50.0)),
            (Channel::Hydrogen, ThresholdConfig::new(20.0, 50.0)),
            (Channel::Methane, ThresholdConfig::new(10.0, 30.0)),
            (Channel::Isoprene, ThresholdConfig::new(200.0, 500.0)),
            (Channel::CarbonMonoxide, ThresholdConfig::new(5.0, 9.0)),
            (Channel::NitricOxide, ThresholdConfig::new(25.0, 50.0)),
        ];
        Self(defaults.into_iter().collect())
    }
}

impl AppThresholds {
    /// An empty mapping; every channel must be set before evaluation.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, channel: Channel) -> Option<&ThresholdConfig> {
        self.0.get(&channel)
    }

    pub fn set(&mut self, channel: Channel, config: ThresholdConfig) {
        self.0.insert(channel, config);
    }

    #[allow(dead_code)] // Used to build partial tables in tests
    pub fn remove(&mut self, channel: Channel) -> Option<ThresholdConfig> {
        self.0.remove(&channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Channel, &ThresholdConfig)> {
        self.0.iter()
    }

    /// Copies entries from `other` for channels not present here.
    pub fn fill_missing_from(&mut self, other: &AppThresholds) {
        for (channel, config) in &other.0 {
            self.0.entry(*channel).or_insert(*config);
        }
    }

    /// Returns the thresholds for `channel` or a configuration error.
    pub fn require(&self, channel: Channel) -> EngineResult<&ThresholdConfig> {
        self.get(channel).ok_or_else(|| {
            EngineError::Configuration(format!("no threshold configured for {}", channel.key()))
        })
    }

    /// Validates every entry and that all evaluated channels are present.
    pub fn validate(&self) -> EngineResult<()> {
        for channel in Channel::ALL {
            self.require(channel)?.validate(channel)?;
        }
        Ok(())
    }
}

/// A patient-reported symptom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Symptom {
    Thirst,
    Fatigue,
    FrequentUrination,
    Nausea,
    Dizziness,
    Confusion,
    AbdominalPain,
    ShortnessOfBreath,
    ChestPain,
    NightSweats,
    UnexplainedWeightLoss,
    DryCough,
}

impl Symptom {
    pub const ALL: [Symptom; 12] = [
        Symptom::Thirst,
        Symptom::Fatigue,
        Symptom::FrequentUrination,
        Symptom::Nausea,
        Symptom::Dizziness,
        Symptom::Confusion,
        Symptom::AbdominalPain,
        Symptom::ShortnessOfBreath,
        Symptom::ChestPain,
        Symptom::NightSweats,
        Symptom::UnexplainedWeightLoss,
        Symptom::DryCough,
    ];

    /// Lowercase words, as used in the clinical-correlation paragraph.
    pub fn label(&self) -> &'static str {
        match self {
            Symptom::Thirst => "thirst",
            Symptom::Fatigue => "fatigue",
            Symptom::FrequentUrination => "frequent urination",
            Symptom::Nausea => "nausea",
            Symptom::Dizziness => "dizziness",
            Symptom::Confusion => "confusion",
            Symptom::AbdominalPain => "abdominal pain",
            Symptom::ShortnessOfBreath => "shortness of breath",
            Symptom::ChestPain => "chest pain",
            Symptom::NightSweats => "night sweats",
            Symptom::UnexplainedWeightLoss => "unexplained weight loss",
            Symptom::DryCough => "dry cough",
        }
    }
}

/// Presence flags over the fixed symptom vocabulary.
///
/// Unknown keys in serialized input are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymptomState {
    pub thirst: bool,
    pub fatigue: bool,
    pub frequent_urination: bool,
    pub nausea: bool,
    pub dizziness: bool,
    pub confusion: bool,
    pub abdominal_pain: bool,
    pub shortness_of_breath: bool,
    pub chest_pain: bool,
    pub night_sweats: bool,
    pub unexplained_weight_loss: bool,
    pub dry_cough: bool,
}

impl SymptomState {
    /// Creates a state with the given symptoms set.
    pub fn with(symptoms: &[Symptom]) -> Self {
        let mut state = Self::default();
        for symptom in symptoms {
            state.set(*symptom, true);
        }
        state
    }

    fn flag_mut(&mut self, symptom: Symptom) -> &mut bool {
        match symptom {
            Symptom::Thirst => &mut self.thirst,
            Symptom::Fatigue => &mut self.fatigue,
            Symptom::FrequentUrination => &mut self.frequent_urination,
            Symptom::Nausea => &mut self.nausea,
            Symptom::Dizziness => &mut self.dizziness,
            Symptom::Confusion => &mut self.confusion,
            Symptom::AbdominalPain => &mut self.abdominal_pain,
            Symptom::ShortnessOfBreath => &mut self.shortness_of_breath,
            Symptom::ChestPain => &mut self.chest_pain,
            Symptom::NightSweats => &mut self.night_sweats,
            Symptom::UnexplainedWeightLoss => &mut self.unexplained_weight_loss,
            Symptom::DryCough => &mut self.dry_cough,
        }
    }

    pub fn set(&mut self, symptom: Symptom, present: bool) {
        *self.flag_mut(symptom) = present;
    }

    pub fn is_set(&self, symptom: Symptom) -> bool {
        match symptom {
            Symptom::Thirst => self.thirst,
            Symptom::Fatigue => self.fatigue,
            Symptom::FrequentUrination => self.frequent_urination,
            Symptom::Nausea => self.nausea,
            Symptom::Dizziness => self.dizziness,
            Symptom::Confusion => self.confusion,
            Symptom::AbdominalPain => self.abdominal_pain,
            Symptom::ShortnessOfBreath => self.shortness_of_breath,
            Symptom::ChestPain => self.chest_pain,
            Symptom::NightSweats => self.night_sweats,
            Symptom::UnexplainedWeightLoss => self.unexplained_weight_loss,
            Symptom::DryCough => self.dry_cough,
        }
    }

    /// Set symptoms in vocabulary order.
    pub fn active(&self) -> Vec<Symptom> {
        Symptom::ALL
            .into_iter()
            .filter(|s| self.is_set(*s))
            .collect()
    }
}

/// Classification of a single channel reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BiomarkerStatus {
    Normal,
    Elevated,
    Critical,
}

impl fmt::Display for BiomarkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiomarkerStatus::Normal => write!(f, "Normal"),
            BiomarkerStatus::Elevated => write!(f, "Elevated"),
            BiomarkerStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// Evaluated status of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerInsight {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: BiomarkerStatus,
    pub interpretation: String,
}

/// A differential-diagnosis candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseLikelihood {
    pub name: String,
    /// Percentage, 0-100.
    pub probability: u8,
}

/// Overall risk of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Maps the top candidate's probability to a risk level.
    pub fn from_probability(probability: u8) -> Self {
        match probability {
            p if p >= 80 => RiskLevel::Critical,
            p if p >= 50 => RiskLevel::High,
            p if p >= 25 => RiskLevel::Moderate,
            _ => RiskLevel::Low,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Moderate => "🟡",
            RiskLevel::High => "🟠",
            RiskLevel::Critical => "🔴",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Moderate => write!(f, "Moderate"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// The finished analysis. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub id: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub diseases: Vec<DiseaseLikelihood>,
    /// Newline-separated lines with `**bold**` markers.
    pub explanation: String,
    /// Items separated by `||`.
    pub recommendation: String,
    pub biomarker_insights: Vec<BiomarkerInsight>,
}

impl AnalysisReport {
    /// Highest-ranked candidate, if any.
    pub fn top_condition(&self) -> Option<&DiseaseLikelihood> {
        self.diseases.first()
    }

    /// Recommendation items split on the `||` delimiter.
    pub fn recommendations(&self) -> Vec<&str> {
        self.recommendation
            .split("||")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}
