//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.odoursense.toml` files.

use crate::error::{EngineError, EngineResult};
use crate::models::{AppThresholds, Channel, ThresholdConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".odoursense.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Per-channel thresholds, keyed by channel name.
    #[serde(default = "default_thresholds")]
    pub thresholds: BTreeMap<String, ThresholdConfig>,

    /// Simulator settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Model-backed analyzer settings.
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            thresholds: default_thresholds(),
            simulation: SimulationConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

fn default_thresholds() -> BTreeMap<String, ThresholdConfig> {
    AppThresholds::default()
        .iter()
        .map(|(channel, config)| (channel.key().to_string(), *config))
        .collect()
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Where past reports are kept.
    #[serde(default = "default_history_path")]
    pub history_path: String,

    /// Append each new report to the history file.
    #[serde(default = "default_true")]
    pub save_history: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            history_path: default_history_path(),
            save_history: true,
        }
    }
}

fn default_output() -> String {
    "odoursense_report.md".to_string()
}

fn default_history_path() -> String {
    "odoursense_history.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Drift simulator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Samples taken before the last one is analyzed.
    #[serde(default = "default_ticks")]
    pub ticks: usize,

    /// Delay between samples in milliseconds.
    #[serde(default)]
    pub tick_ms: u64,

    /// Fixed seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            tick_ms: 0,
            seed: None,
        }
    }
}

fn default_ticks() -> usize {
    30
}

/// Ollama settings for the model-backed analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Use the model instead of the rule engine.
    #[serde(default)]
    pub enabled: bool,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ollama_url: default_ollama_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    120
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref history) = args.history {
            self.general.history_path = history.display().to_string();
        }
        if args.no_save {
            self.general.save_history = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        for (channel, config) in &args.set_threshold {
            self.set_threshold(*channel, *config);
        }

        if let Some(ticks) = args.ticks {
            self.simulation.ticks = ticks;
        }
        if let Some(tick_ms) = args.tick_ms {
            self.simulation.tick_ms = tick_ms;
        }
        if args.seed.is_some() {
            self.simulation.seed = args.seed;
        }

        if args.remote {
            self.remote.enabled = true;
        }
        if let Some(ref model) = args.model {
            self.remote.model = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.remote.ollama_url = url.clone();
        }
    }

    /// Replace the thresholds of `channel`, whatever key case the file used.
    pub fn set_threshold(&mut self, channel: Channel, config: ThresholdConfig) {
        self.thresholds
            .retain(|key, _| Channel::from_key(key) != Some(channel));
        self.thresholds.insert(channel.key().to_string(), config);
    }

    /// Resolve the threshold table.
    ///
    /// Channels missing from the file keep their defaults. Unknown channel
    /// names, a channel listed twice and inconsistent bounds are
    /// configuration errors.
    pub fn resolved_thresholds(&self) -> EngineResult<AppThresholds> {
        let mut thresholds = AppThresholds::empty();

        for (key, config) in &self.thresholds {
            let channel = Channel::from_key(key).ok_or_else(|| {
                EngineError::Configuration(format!("unknown threshold channel '{}'", key))
            })?;
            if thresholds.get(channel).is_some() {
                return Err(EngineError::Configuration(format!(
                    "thresholds for {} are listed more than once",
                    channel.key()
                )));
            }
            thresholds.set(channel, *config);
        }

        thresholds.fill_missing_from(&AppThresholds::default());
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// History file location.
    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(&self.general.history_path)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
