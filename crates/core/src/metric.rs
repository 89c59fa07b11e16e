//! The five greenhouse metrics and their physical limits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// One of the fixed set of sensed quantities.  The snake_case name is the
/// wire and storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    SoilMoisture,
    LightLevel,
    Co2Level,
}

/// How a metric's value is quantized after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Rounded half away from zero to one decimal place.
    Tenths,
    /// Truncated toward zero.
    Whole,
}

impl Metric {
    /// Canonical order: the order readings list their fields and reports
    /// list their trends.
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::SoilMoisture,
        Metric::LightLevel,
        Metric::Co2Level,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::SoilMoisture => "soil_moisture",
            Self::LightLevel => "light_level",
            Self::Co2Level => "co2_level",
        }
    }

    /// Human-facing name used in report headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::SoilMoisture => "Soil moisture",
            Self::LightLevel => "Light level",
            Self::Co2Level => "CO2 level",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity | Self::SoilMoisture => "%",
            Self::LightLevel => "lux",
            Self::Co2Level => "ppm",
        }
    }

    /// Closed range every emitted value is clamped into.
    pub fn bounds(self) -> Bounds {
        match self {
            Self::Temperature => Bounds::new(15.0, 35.0),
            Self::Humidity => Bounds::new(60.0, 90.0),
            Self::SoilMoisture => Bounds::new(50.0, 80.0),
            Self::LightLevel => Bounds::at_least(0.0),
            Self::Co2Level => Bounds::at_least(400.0),
        }
    }

    /// Standard deviation of the additive Gaussian noise, in metric units.
    pub fn noise_sigma(self) -> f64 {
        match self {
            Self::Temperature => 0.3,
            Self::Humidity => 2.0,
            Self::SoilMoisture => 1.0,
            Self::LightLevel => 1000.0,
            Self::Co2Level => 50.0,
        }
    }

    pub fn precision(self) -> Precision {
        match self {
            Self::Temperature => Precision::Tenths,
            _ => Precision::Whole,
        }
    }

    /// Quantize a clamped value to the metric's precision.
    pub fn quantize(self, value: f64) -> f64 {
        match self.precision() {
            Precision::Tenths => (value * 10.0).round() / 10.0,
            Precision::Whole => value.trunc(),
        }
    }

    /// Render a value the way the formatted telemetry line shows it:
    /// `25.3` for temperature, `75` for the integer metrics.
    pub fn format_value(self, value: f64) -> String {
        match self.precision() {
            Precision::Tenths => format!("{value:.1}"),
            Precision::Whole => format!("{}", value as i64),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| Error::UnsupportedMetric(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Inclusive value range.  `upper` is `f64::INFINITY` for metrics with only a
/// floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub const fn at_least(lower: f64) -> Self {
        Self {
            lower,
            upper: f64::INFINITY,
        }
    }

    /// Hard clamp, `max(min(v, upper), lower)`.  Noise that pushes a value
    /// past a bound is silently truncated, so the tails of the noise
    /// distribution pile up on the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.min(self.upper).max(self.lower)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

// ===========================================================================
// Tests
// ===========================================================================
