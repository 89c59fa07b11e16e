//! Threshold classification of a fitted trend.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fit::TrendResult;

/// Slopes with a smaller magnitude (units per sample) count as flat.
pub const STABLE_SLOPE: f64 = 0.01;
/// R² above this marks the fit as reliable.
pub const RELIABLE_R_SQUARED: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increasing,
    Decreasing,
    Stable,
}

impl Direction {
    pub fn from_slope(slope: f64) -> Self {
        if slope.abs() < STABLE_SLOPE {
            Self::Stable
        } else if slope > 0.0 {
            Self::Increasing
        } else {
            Self::Decreasing
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Reliable,
    Cautious,
}

impl Confidence {
    pub fn from_r_squared(r_squared: f64) -> Self {
        if r_squared > RELIABLE_R_SQUARED {
            Self::Reliable
        } else {
            Self::Cautious
        }
    }

    /// Clause appended to a direction sentence in narratives.
    pub fn phrase(self) -> &'static str {
        match self {
            Self::Reliable => "Trend analysis is highly reliable",
            Self::Cautious => "Trend analysis should be interpreted cautiously",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reliable => write!(f, "reliable"),
            Self::Cautious => write!(f, "cautious"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub direction: Direction,
    pub confidence: Confidence,
}

impl Classification {
    pub fn of(trend: &TrendResult) -> Self {
        Self {
            direction: Direction::from_slope(trend.slope),
            confidence: Confidence::from_r_squared(trend.r_squared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_slope_is_stable() {
        assert_eq!(Direction::from_slope(0.005), Direction::Stable);
        assert_eq!(Direction::from_slope(-0.0099), Direction::Stable);
        assert_eq!(Direction::from_slope(0.0), Direction::Stable);
    }

    #[test]
    fn positive_slope_is_increasing() {
        assert_eq!(Direction::from_slope(0.02), Direction::Increasing);
        // threshold itself is not stable
        assert_eq!(Direction::from_slope(0.01), Direction::Increasing);
    }

    #[test]
    fn negative_slope_is_decreasing() {
        assert_eq!(Direction::from_slope(-0.5), Direction::Decreasing);
        assert_eq!(Direction::from_slope(-0.01), Direction::Decreasing);
    }

    #[test]
    fn confidence_threshold_is_exclusive() {
        assert_eq!(Confidence::from_r_squared(0.85), Confidence::Reliable);
        assert_eq!(Confidence::from_r_squared(0.7), Confidence::Cautious);
        assert_eq!(Confidence::from_r_squared(0.0), Confidence::Cautious);
    }

    #[test]
    fn classification_of_trend() {
        let c = Classification::of(&TrendResult {
            slope: -1.2,
            intercept: 30.0,
            r_squared: 0.9,
        });
        assert_eq!(c.direction, Direction::Decreasing);
        assert_eq!(c.confidence, Confidence::Reliable);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Classification {
            direction: Direction::Stable,
            confidence: Confidence::Cautious,
        })
        .unwrap();
        assert_eq!(json, r#"{"direction":"stable","confidence":"cautious"}"#);
    }
}
