//! Fixed-window moving average.
//!
//! "Valid" mode: no padding, so a window of `w` over `L` values yields
//! `L - w + 1` means.  The first mean belongs to index `w - 1` of the input;
//! align the output to the tail of the time axis with [`tail_offset`].

use crate::error::{Error, Result};

pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<f64>> {
    let len = values.len();
    if window < 1 || window > len {
        return Err(Error::InvalidWindow { window, len });
    }

    Ok(values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect())
}

/// Index into the original series of the first smoothed value.
pub fn tail_offset(input_len: usize, output_len: usize) -> usize {
    input_len.saturating_sub(output_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < EPS, "index {i}: {a} != {e}");
        }
    }

    #[test]
    fn window_3_basic() {
        let out = moving_average(&[10.0, 11.0, 12.0, 13.0, 14.0], 3).unwrap();
        assert_all_close(&out, &[11.0, 12.0, 13.0]);
    }

    #[test]
    fn window_1_is_identity() {
        let input = [3.5, -1.0, 7.25];
        let out = moving_average(&input, 1).unwrap();
        assert_all_close(&out, &input);
    }

    #[test]
    fn full_window_is_overall_mean() {
        let out = moving_average(&[2.0, 4.0, 6.0, 8.0], 4).unwrap();
        assert_all_close(&out, &[5.0]);
    }

    #[test]
    fn window_larger_than_input_rejected() {
        let err = moving_average(&[1.0, 2.0], 3).unwrap_err();
        assert_eq!(err, Error::InvalidWindow { window: 3, len: 2 });
    }

    #[test]
    fn zero_window_rejected() {
        assert!(moving_average(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn empty_input_rejected() {
        assert!(moving_average(&[], 1).is_err());
    }

    #[test]
    fn offset_aligns_to_tail() {
        let out = moving_average(&[1.0; 48], 3).unwrap();
        assert_eq!(out.len(), 46);
        assert_eq!(tail_offset(48, out.len()), 2);
    }
}
