//! Property tests for generator bounds and the numeric helpers.

use greenhouse_core::{fit_indexed, moving_average, Metric, SeriesGenerator};
use proptest::prelude::*;
use time::macros::datetime;
use time::Duration;

fn arb_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e4..1.0e4_f64, 1..64)
}

proptest! {
    /// Every generated value lies inside its metric's bounds.
    #[test]
    fn generated_values_in_bounds(seed in any::<u64>(), count in 1usize..200, minutes in 1i64..240) {
        let mut rng = fastrand::Rng::with_seed(seed);
        let series = SeriesGenerator::default()
            .generate(datetime!(2025-01-21 00:00:00), count, Duration::minutes(minutes), &mut rng)
            .unwrap();

        prop_assert_eq!(series.len(), count);
        for r in &series {
            for m in Metric::ALL {
                prop_assert!(m.bounds().contains(r.value(m)), "{} = {}", m, r.value(m));
            }
        }
    }

    /// Smoothed length is `L - w + 1`.
    #[test]
    fn smoothed_length((values, window) in arb_values().prop_flat_map(|v| {
        let len = v.len();
        (Just(v), 1..=len)
    })) {
        let out = moving_average(&values, window).unwrap();
        prop_assert_eq!(out.len(), values.len() - window + 1);
    }

    /// A window of one returns the input unchanged.
    #[test]
    fn unit_window_is_identity(values in arb_values()) {
        prop_assert_eq!(moving_average(&values, 1).unwrap(), values);
    }

    /// A full-length window returns the overall mean.
    #[test]
    fn full_window_is_mean(values in arb_values()) {
        let out = moving_average(&values, values.len()).unwrap();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        prop_assert_eq!(out.len(), 1);
        prop_assert!((out[0] - mean).abs() < 1e-6);
    }

    /// Noise-free lines are recovered exactly.
    #[test]
    fn linear_input_recovered(
        slope in -50.0..50.0_f64,
        intercept in -100.0..100.0_f64,
        len in 2usize..100,
    ) {
        let y: Vec<f64> = (0..len).map(|i| slope * i as f64 + intercept).collect();
        let t = fit_indexed(&y).unwrap();
        prop_assert!((t.slope - slope).abs() < 1e-6);
        prop_assert!((t.intercept - intercept).abs() < 1e-5);
        prop_assert!((0.0..=1.0).contains(&t.r_squared));
    }
}
