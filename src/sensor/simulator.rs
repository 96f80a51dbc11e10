//! Synthetic sensor drift.
//!
//! Emulates a breath-sensor board: the first sample is a fixed healthy
//! baseline and every later sample random-walks each channel within its
//! physical range. High humidity inflates the acetone reading.

use crate::models::SensorReadings;
use crate::sensor::SensorSource;
use anyhow::Result;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Humidity above which acetone reads high.
const HUMID_ABOVE: f64 = 60.0;
const HUMIDITY_ACETONE_FACTOR: f64 = 1.05;

/// Random-walk bounds for one channel.
#[derive(Debug, Clone, Copy)]
struct Drift {
    min: f64,
    max: f64,
    volatility: f64,
}

const fn drift(min: f64, max: f64, volatility: f64) -> Drift {
    Drift {
        min,
        max,
        volatility,
    }
}

const ACETONE: Drift = drift(0.2, 10.0, 0.1);
const AMMONIA: Drift = drift(0.1, 5.0, 0.05);
const SULFUR: Drift = drift(0.05, 2.0, 0.02);
const ETHANOL: Drift = drift(0.0, 300.0, 1.5);
const ETHER: Drift = drift(0.0, 100.0, 0.5);
const HYDROGEN: Drift = drift(2.0, 80.0, 1.0);
const METHANE: Drift = drift(0.0, 40.0, 0.5);
const ISOPRENE: Drift = drift(20.0, 600.0, 5.0);
const CARBON_MONOXIDE: Drift = drift(0.0, 15.0, 0.2);
const NITRIC_OXIDE: Drift = drift(5.0, 100.0, 2.0);
const TEMPERATURE: Drift = drift(36.0, 37.5, 0.1);
const HUMIDITY: Drift = drift(30.0, 80.0, 2.0);

/// Mock sensor board producing drifting readings.
pub struct DriftSimulator {
    rng: StdRng,
    previous: Option<SensorReadings>,
    ticks: usize,
}

impl DriftSimulator {
    /// Simulator seeded from system entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible simulator.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            previous: None,
            ticks: 0,
        }
    }

    /// Number of samples produced so far.
    #[allow(dead_code)]
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// The fixed first sample.
    pub fn baseline(timestamp: i64) -> SensorReadings {
        SensorReadings {
            acetone: 0.5,
            ammonia: 0.2,
            sulfur: 0.1,
            ethanol: 0.0,
            ether: 0.0,
            hydrogen: 5.0,
            methane: 2.0,
            isoprene: 50.0,
            carbon_monoxide: 0.5,
            nitric_oxide: 15.0,
            temperature: 36.5,
            humidity: 45.0,
            timestamp,
        }
    }

    fn walk(&mut self, value: f64, bounds: Drift) -> f64 {
        let change = (self.rng.gen::<f64>() - 0.5) * bounds.volatility;
        (value + change).clamp(bounds.min, bounds.max)
    }

    /// Produce the next snapshot from `prev`.
    pub fn step(&mut self, prev: &SensorReadings, timestamp: i64) -> SensorReadings {
        let humidity = self.walk(prev.humidity, HUMIDITY);
        let humidity_factor = if humidity > HUMID_ABOVE {
            HUMIDITY_ACETONE_FACTOR
        } else {
            1.0
        };

        SensorReadings {
            acetone: self.walk(prev.acetone, ACETONE) * humidity_factor,
            ammonia: self.walk(prev.ammonia, AMMONIA),
            sulfur: self.walk(prev.sulfur, SULFUR),
            ethanol: self.walk(prev.ethanol, ETHANOL),
            ether: self.walk(prev.ether, ETHER),
            hydrogen: self.walk(prev.hydrogen, HYDROGEN),
            methane: self.walk(prev.methane, METHANE),
            isoprene: self.walk(prev.isoprene, ISOPRENE),
            carbon_monoxide: self.walk(prev.carbon_monoxide, CARBON_MONOXIDE),
            nitric_oxide: self.walk(prev.nitric_oxide, NITRIC_OXIDE),
            temperature: self.walk(prev.temperature, TEMPERATURE),
            humidity,
            timestamp,
        }
    }
}

impl Default for DriftSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for DriftSimulator {
    fn next_reading(&mut self) -> Result<SensorReadings> {
        let now = Utc::now().timestamp_millis();
        let next = match self.previous.take() {
            None => Self::baseline(now),
            Some(prev) => self.step(&prev, now),
        };

        self.previous = Some(next.clone());
        self.ticks += 1;
        Ok(next)
    }
}
