//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{Channel, Symptom, ThresholdConfig};
use clap::Parser;
use std::path::PathBuf;

/// OdourSense - breath-biomarker analysis from gas-sensor readings
///
/// Evaluates a readings snapshot against clinical thresholds, correlates it
/// with reported symptoms and your own history, and writes an explainable
/// differential-diagnosis report.
///
/// Examples:
///   odoursense --readings breath.json --symptoms thirst,frequent-urination
///   odoursense --simulate --ticks 60 --format json
///   odoursense --readings breath.json --set-threshold acetone=2.0:6.0
///   odoursense --list-history
///   odoursense --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file holding one sensor readings snapshot
    #[arg(short, long, value_name = "FILE", conflicts_with = "simulate")]
    pub readings: Option<PathBuf>,

    /// Sample the built-in drift simulator instead of a readings file
    #[arg(long)]
    pub simulate: bool,

    /// Reported symptoms (comma-separated)
    ///
    /// Example: --symptoms thirst,abdominal-pain
    #[arg(short, long, value_name = "SYMPTOMS", value_delimiter = ',')]
    pub symptoms: Vec<SymptomArg>,

    /// JSON file with symptom flags (unknown keys are ignored)
    #[arg(long, value_name = "FILE")]
    pub symptoms_file: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .odoursense.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// History file used for baselines and saved reports
    #[arg(long, value_name = "FILE", env = "ODOURSENSE_HISTORY")]
    pub history: Option<PathBuf>,

    /// Do not append the report to history
    #[arg(long)]
    pub no_save: bool,

    /// Print the stored report history and exit
    #[arg(long)]
    pub list_history: bool,

    /// Override a channel threshold, as CHANNEL=WARNING:CRITICAL
    ///
    /// Example: --set-threshold acetone=2.0:6.0 (repeatable)
    #[arg(long, value_name = "OVERRIDE", value_parser = parse_threshold_override)]
    pub set_threshold: Vec<(Channel, ThresholdConfig)>,

    /// Number of simulator ticks to sample before analysis
    #[arg(long, value_name = "COUNT")]
    pub ticks: Option<usize>,

    /// Milliseconds between simulator ticks
    #[arg(long, value_name = "MS")]
    pub tick_ms: Option<u64>,

    /// Seed for a reproducible simulator run
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Use the model-backed analyzer instead of the rule engine
    #[arg(long)]
    pub remote: bool,

    /// Ollama model used by --remote
    #[arg(short, long, env = "ODOURSENSE_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Fail if the report risk is at or above this level
    ///
    /// Useful for automated screening. Exit code 2 when threshold is exceeded.
    /// Values: low, moderate, high, critical
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .odoursense.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Symptom names accepted by --symptoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SymptomArg {
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

impl From<SymptomArg> for Symptom {
    fn from(arg: SymptomArg) -> Self {
        match arg {
            SymptomArg::Thirst => Symptom::Thirst,
            SymptomArg::Fatigue => Symptom::Fatigue,
            SymptomArg::FrequentUrination => Symptom::FrequentUrination,
            SymptomArg::Nausea => Symptom::Nausea,
            SymptomArg::Dizziness => Symptom::Dizziness,
            SymptomArg::Confusion => Symptom::Confusion,
            SymptomArg::AbdominalPain => Symptom::AbdominalPain,
            SymptomArg::ShortnessOfBreath => Symptom::ShortnessOfBreath,
            SymptomArg::ChestPain => Symptom::ChestPain,
            SymptomArg::NightSweats => Symptom::NightSweats,
            SymptomArg::UnexplainedWeightLoss => Symptom::UnexplainedWeightLoss,
            SymptomArg::DryCough => Symptom::DryCough,
        }
    }
}

/// Risk level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Moderate,
    High,
    Critical,
}

/// Parse `channel=warning:critical`.
fn parse_threshold_override(raw: &str) -> Result<(Channel, ThresholdConfig), String> {
    let (key, limits) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CHANNEL=WARNING:CRITICAL, got '{}'", raw))?;

    let channel = Channel::from_key(key.trim()).ok_or_else(|| {
        let known: Vec<&str> = Channel::ALL.iter().map(|c| c.key()).collect();
        format!("unknown channel '{}' (known: {})", key, known.join(", "))
    })?;

    let (warning, critical) = limits
        .split_once(':')
        .ok_or_else(|| format!("expected WARNING:CRITICAL, got '{}'", limits))?;

    let warning: f64 = warning
        .trim()
        .parse()
        .map_err(|_| format!("invalid warning value '{}'", warning))?;
    let critical: f64 = critical
        .trim()
        .parse()
        .map_err(|_| format!("invalid critical value '{}'", critical))?;

    let config = ThresholdConfig::new(warning, critical);
    config.validate(channel).map_err(|e| e.to_string())?;

    Ok((channel, config))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if !self.list_history && self.readings.is_none() && !self.simulate {
            return Err("Provide --readings FILE or --simulate".to_string());
        }

        if let Some(ref readings) = self.readings {
            if !readings.is_file() {
                return Err(format!("Readings file does not exist: {}", readings.display()));
            }
        }

        if let Some(ref symptoms_file) = self.symptoms_file {
            if !symptoms_file.is_file() {
                return Err(format!(
                    "Symptoms file does not exist: {}",
                    symptoms_file.display()
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.ticks == Some(0) {
            return Err("Ticks must be at least 1".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file. `--quiet`
    /// wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
