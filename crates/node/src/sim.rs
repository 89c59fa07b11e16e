//! Simulation settings for the node, read from the environment.
//!
//! Unset variables take their defaults; a variable that is set but does not
//! parse is an error.

use anyhow::{anyhow, Context, Result};
use greenhouse_core::series::parse_timestamp;
use greenhouse_core::{Baseline, Series, SeriesGenerator, SignalModel};
use std::str::FromStr;
use time::{Duration, PrimitiveDateTime};

/// Longest sampling interval accepted, one day.
const MAX_INTERVAL_MIN: i64 = 24 * 60;

/// Where and how fast the node publishes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub node_id: String,
    /// Topic that receives the human-readable line of every reading.
    pub text_topic: String,
    pub publish_delay_ms: u64,
    pub dry_run: bool,
    pub sim: SimSettings,
}

/// What the node simulates.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSettings {
    pub seed: Option<u64>,
    pub start: PrimitiveDateTime,
    pub samples: usize,
    pub interval_min: i64,
    pub baseline: Baseline,
}

/// Look `key` up and parse it, or return `default` when it is unset or blank.
fn parsed<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {key}={raw:?}: {e}")),
        _ => Ok(default),
    }
}

fn flag<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Result<bool> {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "" | "0" | "false" | "no" => Ok(false),
            "1" | "true" | "yes" => Ok(true),
            _ => Err(anyhow!("invalid {key}={v:?}: expected true or false")),
        },
    }
}

impl NodeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let node_id: String = parsed(&lookup, "NODE_ID", "gh-1".to_string())?;
        if node_id.contains(['/', '+', '#']) {
            return Err(anyhow!(
                "invalid NODE_ID={node_id:?}: must not contain '/', '+' or '#'"
            ));
        }

        Ok(Self {
            mqtt_host: parsed(&lookup, "MQTT_HOST", "127.0.0.1".to_string())?,
            mqtt_port: parsed(&lookup, "MQTT_PORT", 1883)?,
            node_id,
            text_topic: parsed(&lookup, "MQTT_TEXT_TOPIC", "greenhouse".to_string())?,
            publish_delay_ms: parsed(&lookup, "PUBLISH_DELAY_MS", 1000)?,
            dry_run: flag(&lookup, "SIM_DRY_RUN")?,
            sim: SimSettings::from_lookup(&lookup)?,
        })
    }

    /// Topic the JSON record is published to.
    pub fn telemetry_topic(&self) -> String {
        format!("tele/{}/reading", self.node_id)
    }
}

impl SimSettings {
    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: &F) -> Result<Self> {
        let seed: Option<u64> = match lookup("SIM_SEED") {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse()
                    .map_err(|e| anyhow!("invalid SIM_SEED={raw:?}: {e}"))?,
            ),
            _ => None,
        };

        let start = match lookup("SIM_START") {
            Some(raw) if !raw.trim().is_empty() => {
                parse_timestamp(raw.trim()).context("invalid SIM_START")?
            }
            _ => time::macros::datetime!(2025-01-21 00:00:00),
        };

        let samples: usize = parsed(lookup, "SIM_SAMPLES", 48)?;
        if samples == 0 {
            return Err(anyhow!("invalid SIM_SAMPLES=0: must be positive"));
        }
        let interval_min: i64 = parsed(lookup, "SIM_INTERVAL_MIN", 30)?;
        if !(1..=MAX_INTERVAL_MIN).contains(&interval_min) {
            return Err(anyhow!(
                "invalid SIM_INTERVAL_MIN={interval_min}: must be between 1 and {MAX_INTERVAL_MIN}"
            ));
        }

        let d = Baseline::default();
        let baseline = Baseline {
            temperature: parsed(lookup, "SIM_BASE_TEMP", d.temperature)?,
            humidity: parsed(lookup, "SIM_BASE_HUMIDITY", d.humidity)?,
            soil_moisture: parsed(lookup, "SIM_BASE_SOIL", d.soil_moisture)?,
            light_level: parsed(lookup, "SIM_BASE_LIGHT", d.light_level)?,
            co2_level: parsed(lookup, "SIM_BASE_CO2", d.co2_level)?,
        };

        Ok(Self {
            seed,
            start,
            samples,
            interval_min,
            baseline,
        })
    }

    /// Generate the simulated day.  Seeded settings always give the same
    /// series.
    pub fn build_series(&self) -> Result<Series> {
        let mut rng = match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let generator = SeriesGenerator::new(SignalModel::new(self.baseline));
        let series = generator.generate(
            self.start,
            self.samples,
            Duration::minutes(self.interval_min),
            &mut rng,
        )?;
        Ok(series)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
