//! One simulated greenhouse day, analysed end to end.

use greenhouse_core::series::parse_time_of_day;
use greenhouse_core::{
    analyze, analyze_range, Direction, Metric, Series, SeriesGenerator, TrendReport,
};
use time::macros::datetime;
use time::Duration;

const SEED: u64 = 20250121;

fn reference_day(seed: u64) -> Series {
    let mut rng = fastrand::Rng::with_seed(seed);
    SeriesGenerator::default()
        .generate(
            datetime!(2025-01-21 00:00:00),
            48,
            Duration::minutes(30),
            &mut rng,
        )
        .expect("reference scenario is valid")
}

fn window(series: &Series, from: &str, to: &str) -> TrendReport {
    let range = series.time_window(
        parse_time_of_day(from).unwrap(),
        parse_time_of_day(to).unwrap(),
    );
    analyze_range(series, range, 3).unwrap()
}

#[test]
fn reference_day_has_48_half_hour_samples() {
    let series = reference_day(SEED);
    assert_eq!(series.len(), 48);
    assert_eq!(series.interval(), Some(Duration::minutes(30)));
}

#[test]
fn light_rises_through_the_morning() {
    let series = reference_day(SEED);
    let report = window(&series, "06:00", "14:00");
    assert_eq!(report.points, 17);

    let light = report.get(Metric::LightLevel).unwrap();
    assert!(light.trend.slope > 0.0, "slope {}", light.trend.slope);
    assert_eq!(light.classification.direction, Direction::Increasing);
}

#[test]
fn light_classification_depends_on_the_window() {
    let series = reference_day(SEED);

    let morning = window(&series, "06:00", "14:00");
    let evening = window(&series, "13:00", "20:00");
    let full_day = analyze(&series, 3).unwrap();

    let dir = |r: &TrendReport| r.get(Metric::LightLevel).unwrap().classification.direction;

    assert_eq!(dir(&morning), Direction::Increasing);
    assert_eq!(dir(&evening), Direction::Decreasing);
    // The full day cannot agree with both halves; no automatic sub-day
    // segmentation happens.
    assert!(dir(&full_day) != dir(&morning) || dir(&full_day) != dir(&evening));
}

#[test]
fn full_day_report_narrates_every_metric() {
    let series = reference_day(SEED);
    let report = analyze(&series, 3).unwrap();

    assert_eq!(report.trends.len(), 5);
    for t in &report.trends {
        assert_eq!(t.moving_average.len(), 46);
        assert_eq!(t.smoothing_offset, 2);
        assert!((0.0..=1.0).contains(&t.trend.r_squared));
        assert!(t.narrative.contains("statistical fit R² = "));
    }

    let summary = report.summary();
    assert!(summary.starts_with("Greenhouse Environment Trend Analysis:"));
    assert!(summary.contains("Humidity Trend: Humidity "));
}

#[test]
fn temperature_warms_before_noon() {
    let series = reference_day(SEED);
    let report = window(&series, "06:00", "12:00");
    let temp = report.get(Metric::Temperature).unwrap();
    assert_eq!(temp.classification.direction, Direction::Increasing);
}

#[test]
fn reproducible_under_fixed_seed() {
    assert_eq!(reference_day(SEED), reference_day(SEED));
    let a = analyze(&reference_day(SEED), 3).unwrap();
    let b = analyze(&reference_day(SEED), 3).unwrap();
    assert_eq!(a, b);
}

#[test]
fn records_survive_the_wire() {
    let series = reference_day(SEED);
    let rebuilt: Vec<_> = series
        .iter()
        .map(|r| {
            let json = serde_json::to_string(&r.to_record()).unwrap();
            serde_json::from_str::<greenhouse_core::ReadingRecord>(&json)
                .unwrap()
                .to_reading()
                .unwrap()
        })
        .collect();
    assert_eq!(Series::from_readings(rebuilt).unwrap(), series);
}
