//! Load a node's stored readings and run the trend analysis over them.
//!
//! Shared by the `report` command and the `/api/trends` endpoint.  Storage
//! failures are `anyhow` errors; analysis refusals come back as
//! [`TrendOutcome`] variants so callers can report them separately.

use anyhow::Result;
use greenhouse_core::series::{format_timestamp, parse_time_of_day};
use greenhouse_core::{analyze_range, Metric, Series, TrendReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;
use time::Time;

use crate::config::AnalysisConfig;
use crate::db::Db;

/// What to analyse: an optional window override and an optional
/// time-of-day span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrendRequest {
    pub window: Option<usize>,
    pub span: Option<(Time, Time)>,
}

impl TrendRequest {
    /// Build from raw `HH:MM` strings.  Both ends or neither must be given.
    pub fn parse(
        window: Option<usize>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> greenhouse_core::Result<Self> {
        let span = match (from, to) {
            (None, None) => None,
            (Some(f), Some(t)) => Some((parse_time_of_day(f)?, parse_time_of_day(t)?)),
            _ => {
                return Err(greenhouse_core::Error::Configuration(
                    "a time span needs both 'from' and 'to'".to_string(),
                ))
            }
        };
        Ok(Self { window, span })
    }
}

#[derive(Debug)]
pub enum TrendOutcome {
    /// Nothing stored for the node.
    NoData,
    /// Fewer readings in the requested span than the configured minimum.
    TooFewPoints { points: usize, min_points: usize },
    /// The analysis itself refused the input (window too large, empty span…).
    Rejected(greenhouse_core::Error),
    Analysed(TrendView),
}

/// A report plus the analysed points, ready for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct TrendView {
    pub node_id: String,
    pub timestamps: Vec<String>,
    pub values: BTreeMap<Metric, Vec<f64>>,
    /// Fitted line evaluated at every analysed point.
    pub fitted: BTreeMap<Metric, Vec<f64>>,
    pub report: TrendReport,
}

impl TrendView {
    fn build(node_id: &str, series: &Series, range: Range<usize>, report: TrendReport) -> Self {
        let readings = &series.readings()[range];
        let timestamps = readings
            .iter()
            .map(|r| format_timestamp(r.timestamp()))
            .collect();
        let values = Metric::ALL
            .into_iter()
            .map(|m| (m, readings.iter().map(|r| r.value(m)).collect()))
            .collect();
        let fitted = report
            .trends
            .iter()
            .map(|t| {
                let line = (0..readings.len())
                    .map(|i| t.trend.predict(i as f64))
                    .collect();
                (t.metric, line)
            })
            .collect();

        Self {
            node_id: node_id.to_string(),
            timestamps,
            values,
            fitted,
            report,
        }
    }
}

/// Analyse the stored series of `node_id`.
pub async fn analyze_node(
    db: &Db,
    node_id: &str,
    settings: &AnalysisConfig,
    request: &TrendRequest,
) -> Result<TrendOutcome> {
    let readings = db.load_readings(node_id).await?;
    if readings.is_empty() {
        return Ok(TrendOutcome::NoData);
    }

    let series = match Series::from_readings(readings) {
        Ok(series) => series,
        Err(e) => return Ok(TrendOutcome::Rejected(e)),
    };

    let range = match request.span {
        Some((from, to)) => series.time_window(from, to),
        None => 0..series.len(),
    };

    // Empty spans fall through to the analysis, which reports them.
    if !range.is_empty() && range.len() < settings.min_points {
        return Ok(TrendOutcome::TooFewPoints {
            points: range.len(),
            min_points: settings.min_points,
        });
    }

    let window = request.window.unwrap_or(settings.smoothing_window);
    match analyze_range(&series, range.clone(), window) {
        Ok(report) => {
            tracing::debug!(node_id, points = report.points, window, "trend analysed");
            Ok(TrendOutcome::Analysed(TrendView::build(
                node_id, &series, range, report,
            )))
        }
        Err(e) => Ok(TrendOutcome::Rejected(e)),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
