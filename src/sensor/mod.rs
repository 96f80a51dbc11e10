//! Sensor sources.
//!
//! A source yields `SensorReadings` snapshots: either a recorded JSON
//! document or the drift simulator.

pub mod simulator;

pub use simulator::DriftSimulator;

use crate::models::SensorReadings;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Anything that can produce a readings snapshot.
pub trait SensorSource {
    fn next_reading(&mut self) -> Result<SensorReadings>;
}

/// Reads one snapshot from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SensorSource for FileSource {
    fn next_reading(&mut self) -> Result<SensorReadings> {
        load_readings(&self.path)
    }
}

/// Load a readings snapshot from a JSON file.
pub fn load_readings(path: &Path) -> Result<SensorReadings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read readings file: {}", path.display()))?;

    let readings: SensorReadings = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse readings file: {}", path.display()))?;

    debug!("Loaded readings from {}", path.display());
    Ok(readings)
}

/// Build the progress bar shown while sampling.
pub fn sampling_progress(ticks: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(ticks);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ticks")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Sample `ticks` snapshots, one per `tick_ms`, returning the last one.
///
/// With `tick_ms == 0` the samples are taken back to back.
pub async fn sample(
    source: &mut dyn SensorSource,
    ticks: usize,
    tick_ms: u64,
    progress: &ProgressBar,
) -> Result<SensorReadings> {
    let mut interval = (tick_ms > 0).then(|| tokio::time::interval(Duration::from_millis(tick_ms)));
    let mut latest = None;

    for _ in 0..ticks.max(1) {
        if let Some(interval) = interval.as_mut() {
            interval.tick().await;
        }
        latest = Some(source.next_reading()?);
        progress.inc(1);
    }

    progress.finish_with_message("Sampling complete");
    info!("Sampled {} sensor tick(s)", ticks.max(1));

    latest.context("sensor source produced no readings")
}
