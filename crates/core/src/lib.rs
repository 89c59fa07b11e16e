//! Greenhouse telemetry core: a diurnal signal model that synthesizes a day
//! of sensor readings, and a trend engine that smooths, fits and narrates
//! a series of them.
//!
//! Everything here is pure computation over in-memory data.  Publishing,
//! storage and presentation live in the `greenhouse-node` and
//! `greenhouse-hub` binaries.

pub mod analysis;
pub mod classify;
pub mod error;
pub mod fit;
pub mod metric;
pub mod narrative;
pub mod series;
pub mod signal;
pub mod smooth;

pub use analysis::{analyze, analyze_range, MetricTrend, TrendReport};
pub use classify::{Classification, Confidence, Direction};
pub use error::{Error, Result};
pub use fit::{fit, fit_indexed, TrendResult};
pub use metric::{Bounds, Metric};
pub use narrative::compose;
pub use series::{Reading, ReadingRecord, Series, SeriesGenerator, SensorData};
pub use signal::{Baseline, NoiseSource, SignalModel};
pub use smooth::{moving_average, tail_offset};
