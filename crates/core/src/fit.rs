//! Ordinary least-squares line fit.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Slope, intercept and coefficient of determination of a fitted line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub slope: f64,
    pub intercept: f64,
    /// Square of the Pearson correlation, in `[0, 1]`.  Zero when `y` is
    /// constant: the fitted line is that constant and there is no variance
    /// left to explain.
    pub r_squared: f64,
}

impl TrendResult {
    /// Value of the fitted line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y = slope * x + intercept` by the closed-form OLS estimator.
///
/// Fails with [`Error::DegenerateSeries`] for fewer than two points,
/// mismatched lengths, non-finite values, or constant `x`.
pub fn fit(x: &[f64], y: &[f64]) -> Result<TrendResult> {
    if x.len() != y.len() {
        return Err(Error::DegenerateSeries(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(Error::DegenerateSeries(format!(
            "need at least 2 points to fit a trend, got {}",
            x.len()
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(Error::DegenerateSeries(
            "series contains non-finite values".to_string(),
        ));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    // Centred sums of squares and cross-products.
    let (mut sxx, mut syy, mut sxy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 {
        return Err(Error::DegenerateSeries(
            "x has zero variance, slope is undefined".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 {
        0.0
    } else {
        ((sxy * sxy) / (sxx * syy)).clamp(0.0, 1.0)
    };

    Ok(TrendResult {
        slope,
        intercept,
        r_squared,
    })
}

/// Fit `y` against its positional indices `0..len`.
pub fn fit_indexed(y: &[f64]) -> Result<TrendResult> {
    let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    fit(&x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn perfect_line() {
        let y: Vec<f64> = (0..10).map(|i| 3.0 * i as f64 + 2.0).collect();
        let t = fit_indexed(&y).unwrap();
        assert!((t.slope - 3.0).abs() < EPS, "slope {}", t.slope);
        assert!((t.intercept - 2.0).abs() < EPS, "intercept {}", t.intercept);
        assert!((t.r_squared - 1.0).abs() < EPS, "r2 {}", t.r_squared);
    }

    #[test]
    fn constant_y_has_zero_r_squared() {
        let t = fit_indexed(&[5.0, 5.0, 5.0, 5.0]).unwrap();
        assert!(t.slope.abs() < EPS);
        assert!((t.intercept - 5.0).abs() < EPS);
        assert_eq!(t.r_squared, 0.0);
        assert!(!t.r_squared.is_nan());
    }

    #[test]
    fn negative_slope() {
        let t = fit_indexed(&[10.0, 8.0, 6.0, 4.0]).unwrap();
        assert!((t.slope + 2.0).abs() < EPS);
        assert!((t.r_squared - 1.0).abs() < EPS);
    }

    #[test]
    fn noisy_fit_has_partial_r_squared() {
        let t = fit_indexed(&[1.0, 3.0, 2.0, 4.0, 3.0, 5.0]).unwrap();
        assert!(t.slope > 0.0);
        assert!(t.r_squared > 0.0 && t.r_squared < 1.0);
    }

    #[test]
    fn explicit_x_values() {
        let t = fit(&[1.0, 2.0, 4.0], &[2.0, 4.0, 8.0]).unwrap();
        assert!((t.slope - 2.0).abs() < EPS);
        assert!(t.intercept.abs() < EPS);
    }

    #[test]
    fn predict_on_fitted_line() {
        let t = fit_indexed(&[2.0, 5.0, 8.0]).unwrap();
        assert!((t.predict(10.0) - 32.0).abs() < EPS);
    }

    #[test]
    fn single_point_rejected() {
        assert!(matches!(fit_indexed(&[1.0]), Err(Error::DegenerateSeries(_))));
        assert!(matches!(fit_indexed(&[]), Err(Error::DegenerateSeries(_))));
    }

    #[test]
    fn constant_x_rejected() {
        let err = fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, Error::DegenerateSeries(_)));
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(fit(&[0.0, 1.0, 2.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn nan_rejected() {
        assert!(fit_indexed(&[1.0, f64::NAN, 3.0]).is_err());
    }
}
