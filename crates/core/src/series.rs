//! Readings, series, and the one-day series generator.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use time::macros::format_description;
use time::{Duration, PrimitiveDateTime, Time};

use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::signal::{NoiseSource, SignalModel};

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// ISO-8601 local time without offset, e.g. `2025-01-21T00:30:00`.
pub fn format_timestamp(ts: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        ts.year(),
        ts.month() as u8,
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

/// Inverse of [`format_timestamp`].
pub fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        s.trim(),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .map_err(|e| Error::Configuration(format!("invalid timestamp {s:?}: {e}")))
}

/// Parse `HH:MM` into a time of day.
pub fn parse_time_of_day(s: &str) -> Result<Time> {
    Time::parse(s.trim(), format_description!("[hour]:[minute]"))
        .map_err(|e| Error::Configuration(format!("invalid time of day {s:?}: {e}")))
}

/// Hour of day the signal model is evaluated at.  Uses the clock hour, so
/// 12:00 and 12:30 share a cycle value.
pub fn hour_of_day(ts: PrimitiveDateTime) -> f64 {
    ts.hour() as f64
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// The five metric values of one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    pub light_level: f64,
    pub co2_level: f64,
}

impl SensorData {
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

/// One timestamped sample of every metric.  Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    timestamp: PrimitiveDateTime,
    data: SensorData,
}

impl Reading {
    pub fn new(timestamp: PrimitiveDateTime, data: SensorData) -> Self {
        Self { timestamp, data }
    }

    pub fn timestamp(&self) -> PrimitiveDateTime {
        self.timestamp
    }

    pub fn data(&self) -> &SensorData {
        &self.data
    }

    pub fn value(&self, metric: Metric) -> f64 {
        self.data.get(metric)
    }

    /// Single-line summary published on the plain-text topic.
    pub fn formatted_data(&self) -> String {
        let ts = self.timestamp;
        format!(
            "Timestamp: {:04}-{:02}-{:02} {:02}:{:02}:{:02}, Temperature: {}°C, Humidity: {}%, \
             Soil Moisture: {}%, Light: {} lux, CO2: {} ppm",
            ts.year(),
            ts.month() as u8,
            ts.day(),
            ts.hour(),
            ts.minute(),
            ts.second(),
            Metric::Temperature.format_value(self.data.temperature),
            Metric::Humidity.format_value(self.data.humidity),
            Metric::SoilMoisture.format_value(self.data.soil_moisture),
            Metric::LightLevel.format_value(self.data.light_level),
            Metric::Co2Level.format_value(self.data.co2_level),
        )
    }

    pub fn to_record(&self) -> ReadingRecord {
        ReadingRecord {
            timestamp: format_timestamp(self.timestamp),
            data: self.data,
            formatted_data: self.formatted_data(),
        }
    }
}

/// Wire/storage shape of a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub timestamp: String,
    pub data: SensorData,
    pub formatted_data: String,
}

impl ReadingRecord {
    /// Rebuild the reading.  Values are taken as-is; only the timestamp is
    /// validated.
    pub fn to_reading(&self) -> Result<Reading> {
        Ok(Reading::new(parse_timestamp(&self.timestamp)?, self.data))
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Readings ordered by strictly increasing timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    readings: Vec<Reading>,
}

impl Series {
    /// Validate ordering of a retrieved list of readings.  An empty list is
    /// a valid (empty) series.
    pub fn from_readings(readings: Vec<Reading>) -> Result<Self> {
        if let Some(i) = readings
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(Error::DegenerateSeries(format!(
                "timestamps not strictly increasing at index {}",
                i + 1
            )));
        }
        Ok(Self { readings })
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Values of one metric in series order.
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.readings.iter().map(|r| r.value(metric)).collect()
    }

    pub fn timestamps(&self) -> Vec<PrimitiveDateTime> {
        self.readings.iter().map(|r| r.timestamp).collect()
    }

    /// Spacing between the first two readings.
    pub fn interval(&self) -> Option<Duration> {
        match self.readings.as_slice() {
            [a, b, ..] => Some(b.timestamp - a.timestamp),
            _ => None,
        }
    }

    /// Index range of readings whose time of day lies in `from..=to`.
    /// Assumes a single-day series.  Empty when nothing matches.
    pub fn time_window(&self, from: Time, to: Time) -> Range<usize> {
        let inside = |r: &Reading| {
            let t = r.timestamp.time();
            t >= from && t <= to
        };
        match self.readings.iter().position(inside) {
            Some(start) => {
                let len = self.readings[start..]
                    .iter()
                    .take_while(|r| inside(r))
                    .count();
                start..start + len
            }
            None => 0..0,
        }
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Drives a [`SignalModel`] across a uniform sampling grid.
#[derive(Debug, Clone, Default)]
pub struct SeriesGenerator {
    model: SignalModel,
}

impl SeriesGenerator {
    pub fn new(model: SignalModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &SignalModel {
        &self.model
    }

    /// Produce exactly `count` readings at `start + k * interval`.
    ///
    /// Noise is drawn metric by metric in canonical order for each reading,
    /// so a seeded source reproduces the same series.
    pub fn generate<N: NoiseSource + ?Sized>(
        &self,
        start: PrimitiveDateTime,
        count: usize,
        interval: Duration,
        noise: &mut N,
    ) -> Result<Series> {
        if count == 0 {
            return Err(Error::Configuration(
                "sample count must be positive".to_string(),
            ));
        }
        if interval <= Duration::ZERO {
            return Err(Error::Configuration(format!(
                "sampling interval must be positive, got {interval}"
            )));
        }

        let mut readings = Vec::with_capacity(count);
        for k in 0..count {
            let offset = i32::try_from(k)
                .ok()
                .and_then(|k| interval.checked_mul(k))
                .ok_or_else(|| Error::Configuration("sampling grid overflows".to_string()))?;
            let timestamp = start.checked_add(offset).ok_or_else(|| {
                Error::Configuration(format!("timestamp out of range at sample {k}"))
            })?;

            let hour = hour_of_day(timestamp);
            let mut sample = |metric: Metric| self.model.sample(metric, hour, &mut *noise);
            let data = SensorData {
                temperature: sample(Metric::Temperature),
                humidity: sample(Metric::Humidity),
                soil_moisture: sample(Metric::SoilMoisture),
                light_level: sample(Metric::LightLevel),
                co2_level: sample(Metric::Co2Level),
            };
            readings.push(Reading::new(timestamp, data));
        }

        tracing::debug!(
            count,
            interval = %interval,
            start = %format_timestamp(start),
            "generated series"
        );

        Ok(Series { readings })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
