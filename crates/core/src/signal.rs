//! Diurnal signal model for simulated greenhouse sensors.
//!
//! Each metric is a deterministic function of the hour of day (a sine
//! anchored at 06:00, peaking at 12:00) on top of a baseline, plus Gaussian
//! noise drawn from an injected [`NoiseSource`].  Results are hard-clamped
//! to the metric's [`Bounds`](crate::Bounds) and quantized.

use std::f64::consts::PI;

use crate::metric::Metric;

/// Hour at which the daily sine crosses zero on its way up.
const CYCLE_ANCHOR_HOUR: f64 = 6.0;

/// Temperature swing above/below baseline (°C).
const TEMP_AMPLITUDE: f64 = 4.0;
/// Peak daylight contribution (lux).
const LIGHT_AMPLITUDE: f64 = 50_000.0;
/// CO2 drawdown at peak photosynthesis (ppm).
const CO2_AMPLITUDE: f64 = 200.0;
/// Daylight window, inclusive on both ends.
const DAYLIGHT_HOURS: std::ops::RangeInclusive<f64> = 6.0..=18.0;

// ---------------------------------------------------------------------------
// Noise
// ---------------------------------------------------------------------------

/// Source of standard-normal samples.  Every generation run takes its own
/// `&mut` source, so a seeded source reproduces a series exactly.
pub trait NoiseSource {
    /// One sample from N(0, 1).
    fn standard_normal(&mut self) -> f64;

    /// One sample from N(mean, sigma).
    fn gaussian(&mut self, mean: f64, sigma: f64) -> f64 {
        mean + sigma * self.standard_normal()
    }
}

/// Irwin-Hall approximation: sum of 12 uniform [0,1) values minus 6.
/// Samples are bounded to ±6.
impl NoiseSource for fastrand::Rng {
    fn standard_normal(&mut self) -> f64 {
        let mut sum: f64 = 0.0;
        for _ in 0..12 {
            sum += self.f64();
        }
        sum - 6.0
    }
}

// ---------------------------------------------------------------------------
// Baseline
// ---------------------------------------------------------------------------

/// Per-metric resting values the daily cycle is added to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    pub light_level: f64,
    pub co2_level: f64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            humidity: 75.0,
            soil_moisture: 65.0,
            light_level: 0.0,
            co2_level: 800.0,
        }
    }
}

impl Baseline {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::LightLevel => self.light_level,
            Metric::Co2Level => self.co2_level,
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SignalModel {
    baseline: Baseline,
}

/// `sin((h - 6) * π / 12)`: zero at 06:00 and 18:00, one at 12:00.
fn daily_phase(hour: f64) -> f64 {
    ((hour - CYCLE_ANCHOR_HOUR) * PI / 12.0).sin()
}

impl SignalModel {
    pub fn new(baseline: Baseline) -> Self {
        Self { baseline }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Deterministic part of the signal at `hour` (0 to 24, fractional ok).
    ///
    /// Humidity and soil moisture have no cycle and return their baseline.
    pub fn cycle(&self, metric: Metric, hour: f64) -> f64 {
        let base = self.baseline.get(metric);
        match metric {
            Metric::Temperature => base + TEMP_AMPLITUDE * daily_phase(hour),
            Metric::Humidity | Metric::SoilMoisture => base,
            Metric::LightLevel => {
                if DAYLIGHT_HOURS.contains(&hour) {
                    base + LIGHT_AMPLITUDE * daily_phase(hour)
                } else {
                    base
                }
            }
            Metric::Co2Level => base - CO2_AMPLITUDE * daily_phase(hour),
        }
    }

    /// Cycle plus one noise draw, hard-clamped to the metric's bounds and
    /// quantized.  Noise beyond a bound is discarded, not reflected.
    pub fn sample<N: NoiseSource + ?Sized>(&self, metric: Metric, hour: f64, noise: &mut N) -> f64 {
        let raw = noise.gaussian(self.cycle(metric, hour), metric.noise_sigma());
        metric.quantize(metric.bounds().clamp(raw))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
