//! Per-metric trend pipeline: smooth, fit, classify, narrate.
//!
//! Every metric is treated the same way, humidity included.  The fit runs
//! on the raw values against positional indices; the moving average is
//! reported alongside for presentation and does not feed the fit.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::ops::Range;

use crate::classify::Classification;
use crate::error::{Error, Result};
use crate::fit::{fit_indexed, TrendResult};
use crate::metric::Metric;
use crate::narrative::compose;
use crate::series::Series;
use crate::smooth::{moving_average, tail_offset};

/// Default smoothing window for reports.
pub const DEFAULT_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    pub metric: Metric,
    pub trend: TrendResult,
    pub classification: Classification,
    pub narrative: String,
    pub moving_average: Vec<f64>,
    /// Index of the analysed points the first moving-average value lines
    /// up with.
    pub smoothing_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Number of readings analysed.
    pub points: usize,
    pub window: usize,
    /// One entry per metric, in [`Metric::ALL`] order.
    pub trends: Vec<MetricTrend>,
}

impl TrendReport {
    pub fn get(&self, metric: Metric) -> Option<&MetricTrend> {
        self.trends.iter().find(|t| t.metric == metric)
    }

    /// Printable block: a heading and one `"<Label> Trend: <narrative>"`
    /// line per metric.
    pub fn summary(&self) -> String {
        let mut out = String::from("Greenhouse Environment Trend Analysis:\n");
        for t in &self.trends {
            let _ = writeln!(out, "{} Trend: {}", t.metric.label(), t.narrative);
        }
        out
    }
}

/// Analyse the whole series.
pub fn analyze(series: &Series, window: usize) -> Result<TrendReport> {
    analyze_range(series, 0..series.len(), window)
}

/// Analyse the readings at indices `range`.  Positional indices restart at
/// zero for the sub-range.
pub fn analyze_range(series: &Series, range: Range<usize>, window: usize) -> Result<TrendReport> {
    if range.start >= range.end || range.end > series.len() {
        return Err(Error::DegenerateSeries(format!(
            "range {}..{} is empty or outside a series of {} readings",
            range.start,
            range.end,
            series.len()
        )));
    }

    let readings = &series.readings()[range];
    let points = readings.len();
    if points < 2 {
        return Err(Error::DegenerateSeries(format!(
            "need at least 2 readings to analyse, got {points}"
        )));
    }

    let trends = Metric::ALL
        .into_iter()
        .map(|metric| -> Result<MetricTrend> {
            let values: Vec<f64> = readings.iter().map(|r| r.value(metric)).collect();
            let smoothed = moving_average(&values, window)?;
            let trend = fit_indexed(&values)?;
            let classification = Classification::of(&trend);
            Ok(MetricTrend {
                metric,
                trend,
                classification,
                narrative: compose(metric, classification, trend.r_squared),
                smoothing_offset: tail_offset(points, smoothed.len()),
                moving_average: smoothed,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TrendReport {
        points,
        window,
        trends,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Direction;
    use crate::series::{Reading, SensorData};
    use time::macros::datetime;
    use time::Duration;

    /// Series whose every metric rises by `step` per reading.
    fn ramp(n: usize, step: f64) -> Series {
        let start = datetime!(2025-01-21 00:00:00);
        let readings = (0..n)
            .map(|i| {
                let v = i as f64 * step;
                Reading::new(
                    start + Duration::minutes(30 * i as i64),
                    SensorData {
                        temperature: 20.0 + v,
                        humidity: 70.0 + v,
                        soil_moisture: 60.0 + v,
                        light_level: 1000.0 + v,
                        co2_level: 500.0 + v,
                    },
                )
            })
            .collect();
        Series::from_readings(readings).unwrap()
    }

    #[test]
    fn every_metric_reported_in_order() {
        let report = analyze(&ramp(10, 1.0), 3).unwrap();
        let metrics: Vec<Metric> = report.trends.iter().map(|t| t.metric).collect();
        assert_eq!(metrics, Metric::ALL.to_vec());
        assert_eq!(report.points, 10);
    }

    #[test]
    fn humidity_is_fitted_like_the_rest() {
        let report = analyze(&ramp(10, 0.5), 3).unwrap();
        let humidity = report.get(Metric::Humidity).unwrap();
        assert!((humidity.trend.slope - 0.5).abs() < 1e-9);
        assert_eq!(humidity.classification.direction, Direction::Increasing);
        assert!(humidity.narrative.contains("gradually increasing"));
    }

    #[test]
    fn flat_series_is_stable() {
        let report = analyze(&ramp(6, 0.0), 2).unwrap();
        for t in &report.trends {
            assert_eq!(t.classification.direction, Direction::Stable);
            assert_eq!(t.trend.r_squared, 0.0);
        }
    }

    #[test]
    fn moving_average_aligned_to_tail() {
        let report = analyze(&ramp(8, 1.0), 3).unwrap();
        let t = report.get(Metric::Temperature).unwrap();
        assert_eq!(t.moving_average.len(), 6);
        assert_eq!(t.smoothing_offset, 2);
        assert!((t.moving_average[0] - 21.0).abs() < 1e-9);
    }

    #[test]
    fn window_too_large_fails() {
        let err = analyze(&ramp(4, 1.0), 5).unwrap_err();
        assert_eq!(err, Error::InvalidWindow { window: 5, len: 4 });
    }

    #[test]
    fn too_few_points_fails() {
        assert!(matches!(
            analyze(&ramp(1, 1.0), 1),
            Err(Error::DegenerateSeries(_))
        ));
        assert!(matches!(
            analyze(&Series::default(), 1),
            Err(Error::DegenerateSeries(_))
        ));
    }

    #[test]
    fn range_outside_series_fails() {
        assert!(analyze_range(&ramp(5, 1.0), 3..9, 1).is_err());
        assert!(analyze_range(&ramp(5, 1.0), 2..2, 1).is_err());
    }

    #[test]
    fn sub_range_restarts_indices() {
        let report = analyze_range(&ramp(10, 2.0), 4..8, 2).unwrap();
        let t = report.get(Metric::Temperature).unwrap();
        assert_eq!(report.points, 4);
        // first analysed value is 20 + 4 * 2
        assert!((t.trend.intercept - 28.0).abs() < 1e-9);
    }

    #[test]
    fn summary_lists_every_metric() {
        let summary = analyze(&ramp(5, 1.0), 2).unwrap().summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Greenhouse Environment Trend Analysis:");
        assert_eq!(lines.len(), 6);
        assert!(lines[3].starts_with("Soil moisture Trend: Soil moisture is increasing"));
    }
}
