//! OdourSense - breath-biomarker analysis engine
//!
//! A CLI tool that evaluates gas-sensor readings against clinical
//! thresholds, correlates them with reported symptoms and personal history,
//! and writes an explainable differential-diagnosis report.
//!
//! Exit codes:
//!   0 - Success (risk below --fail-on, or no --fail-on set)
//!   1 - Runtime error (invalid reading, config, unreachable model, etc.)
//!   2 - Report risk at or above the --fail-on level

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod remote;
mod report;
mod sensor;
mod store;

use analysis::{HistoryStore, Orchestrator};
use anyhow::{Context, Result};
use cli::{Args, FailOnLevel};
use config::{Config, CONFIG_FILE};
use models::{AnalysisReport, RiskLevel, SensorReadings, Symptom, SymptomState};
use sensor::{DriftSimulator, FileSource, SensorSource};
use std::path::{Path, PathBuf};
use store::JsonHistoryStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration comes first so `general.verbose` can raise the log level
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("OdourSense v{}", env!("CARGO_PKG_VERSION"));
    origin.log();
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .odoursense.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize thresholds, history location, and the remote model.");
    Ok(())
}

/// Initialize logging at the resolved verbosity.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one analysis. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let history = JsonHistoryStore::new(config.history_path());

    if args.list_history {
        return handle_list_history(&history);
    }

    let thresholds = config.resolved_thresholds()?;

    // Step 1: Acquire a readings snapshot
    let readings = acquire_readings(&args, &config).await?;
    debug!("Readings: {:?}", readings);

    // Step 2: Collect symptoms
    let symptoms = collect_symptoms(&args)?;
    let active: Vec<&str> = symptoms.active().iter().map(|s| s.label()).collect();
    if !args.quiet {
        if active.is_empty() {
            println!("🩺 Symptoms: none reported");
        } else {
            println!("🩺 Symptoms: {}", active.join(", "));
        }
    }

    // Step 3: Analyze
    let orchestrator = Orchestrator::new(&history, &thresholds);

    let report = if config.remote.enabled {
        if !args.quiet {
            println!("🤖 Asking {} at {}...", config.remote.model, config.remote.ollama_url);
        }
        let analyzer = remote::RemoteAnalyzer::new(config.remote.clone())?;
        analyzer.analyze(&readings, &symptoms, &thresholds).await?
    } else {
        if !args.quiet {
            println!("🔬 Running rule engine...");
        }
        orchestrator.analyze(&readings, &symptoms)?
    };

    // Step 4: Persist
    if config.general.save_history {
        orchestrator.record(&report);
    } else {
        debug!("History saving disabled");
    }

    // Step 5: Write the report
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config, args.format));
    report::write_report(&report, args.format, &output)?;

    if !args.quiet {
        print_summary(&report);
        println!("\n✅ Report saved to: {}", output.display());
    }

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        if report.risk_level >= fail_on_to_risk(fail_level) {
            eprintln!(
                "\n⛔ Risk level {} is at or above {:?}. Failing (exit code 2).",
                report.risk_level, fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Handle --list-history: print stored reports and exit.
fn handle_list_history(history: &JsonHistoryStore) -> Result<i32> {
    let reports = history.list_all()?;
    info!(
        "Loaded {} report(s) from {}",
        reports.len(),
        history.path().display()
    );

    print!("{}", report::generate_history_listing(&reports));
    Ok(0)
}

/// Read the snapshot from a file or sample the simulator.
async fn acquire_readings(args: &Args, config: &Config) -> Result<SensorReadings> {
    if let Some(ref path) = args.readings {
        info!("Reading sensor snapshot from {}", path.display());
        return FileSource::new(path).next_reading();
    }

    let ticks = config.simulation.ticks.max(1);
    let mut simulator = match config.simulation.seed {
        Some(seed) => DriftSimulator::seeded(seed),
        None => DriftSimulator::new(),
    };

    if !args.quiet {
        println!("📡 Sampling simulated sensor ({} ticks)...", ticks);
    }

    let progress = sensor::sampling_progress(ticks as u64, !args.quiet);
    sensor::sample(&mut simulator, ticks, config.simulation.tick_ms, &progress).await
}

/// Merge the symptom file (if any) with `--symptoms` flags.
fn collect_symptoms(args: &Args) -> Result<SymptomState> {
    let mut symptoms = match args.symptoms_file {
        Some(ref path) => load_symptoms(path)?,
        None => SymptomState::default(),
    };

    for symptom in &args.symptoms {
        symptoms.set(Symptom::from(*symptom), true);
    }

    Ok(symptoms)
}

fn load_symptoms(path: &Path) -> Result<SymptomState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read symptoms file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse symptoms file: {}", path.display()))
}

fn default_output_path(config: &Config, format: cli::OutputFormat) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    match format {
        cli::OutputFormat::Markdown => path,
        cli::OutputFormat::Json => path.with_extension("json"),
    }
}

fn print_summary(report: &AnalysisReport) {
    println!("\n📊 Analysis Summary:");
    println!(
        "   Risk: {} {} - {}",
        report.risk_level.emoji(),
        report.risk_level,
        report.summary
    );

    for disease in report.diseases.iter().take(3) {
        println!("   - {} ({}%)", disease.name, disease.probability);
    }

    let flagged = report
        .biomarker_insights
        .iter()
        .filter(|i| i.status != models::BiomarkerStatus::Normal)
        .count();
    println!(
        "   Biomarkers outside normal range: {}/{}",
        flagged,
        report.biomarker_insights.len()
    );
}

/// Convert FailOnLevel to RiskLevel for comparison.
fn fail_on_to_risk(level: FailOnLevel) -> RiskLevel {
    match level {
        FailOnLevel::Low => RiskLevel::Low,
        FailOnLevel::Moderate => RiskLevel::Moderate,
        FailOnLevel::High => RiskLevel::High,
        FailOnLevel::Critical => RiskLevel::Critical,
    }
}

/// Where the configuration came from. Logged once the subscriber is up.
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    BuiltIn,
    Fallback(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigOrigin::BuiltIn => debug!("No config file found, using defaults"),
            ConfigOrigin::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(e))),
    }
}
