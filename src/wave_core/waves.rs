//! Wave structure classification
//!
//! Takes swing-annotated candles, merges the trailing swing highs and lows
//! into one time-ordered sequence and reads the last five points as a
//! simplified impulse: points 1..3 anchor the structure and the direction
//! comes from comparing the first and fifth point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fibonacci::FibonacciLevels;
use super::swings::{AnnotatedCandle, SwingPoint};

/// Swing highs and lows kept per kind before merging
const TRAILING_SWINGS: usize = 10;

/// Minimum swing highs and swing lows required for a structure
const MIN_SWINGS_PER_KIND: usize = 3;

/// Points kept after merging, before narrowing to the structure window
const MERGED_WINDOW: usize = 10;

/// Points in the structure window
const STRUCTURE_POINTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StructurePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl From<&SwingPoint> for StructurePoint {
    fn from(p: &SwingPoint) -> Self {
        Self {
            timestamp: p.timestamp,
            price: p.price,
        }
    }
}

/// Detected wave structure for one timeframe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveStructure {
    pub trend: Trend,
    pub point_1: StructurePoint,
    pub point_2: StructurePoint,
    pub point_3: StructurePoint,
    pub wave_1_2_amplitude: f64,
    pub current_price: f64,
    pub fibonacci_levels: FibonacciLevels,
}

/// Why no structure could be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoStructure {
    /// Fewer than three swing highs or swing lows
    InsufficientSwings { highs: usize, lows: usize },
    /// Fewer than five merged points
    InsufficientPoints(usize),
    /// First and fifth point at the same price
    NoDirection,
    /// Non-finite prices or a zero wave 1 move
    Degenerate,
}

impl std::fmt::Display for NoStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientSwings { highs, lows } => {
                write!(f, "insufficient swings ({} highs, {} lows)", highs, lows)
            }
            Self::InsufficientPoints(n) => write!(f, "insufficient structure points ({})", n),
            Self::NoDirection => write!(f, "no directional inequality"),
            Self::Degenerate => write!(f, "degenerate prices"),
        }
    }
}

/// Outcome of a classification pass
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Found(WaveStructure),
    NoStructure(NoStructure),
}

impl Classification {
    pub fn into_structure(self) -> Option<WaveStructure> {
        match self {
            Self::Found(structure) => Some(structure),
            Self::NoStructure(reason) => {
                debug!("No wave structure: {}", reason);
                None
            }
        }
    }
}

/// Classify the wave structure of an annotated candle series
pub fn classify(annotated: &[AnnotatedCandle]) -> Classification {
    let highs = trailing(annotated.iter().filter_map(|a| a.swing_high_point()).collect());
    let lows = trailing(annotated.iter().filter_map(|a| a.swing_low_point()).collect());

    if highs.len() < MIN_SWINGS_PER_KIND || lows.len() < MIN_SWINGS_PER_KIND {
        return Classification::NoStructure(NoStructure::InsufficientSwings {
            highs: highs.len(),
            lows: lows.len(),
        });
    }

    // Highs are chained first so a high and low on the same candle keep that order
    let mut merged: Vec<SwingPoint> = highs.into_iter().chain(lows).collect();
    merged.sort_by_key(|p| p.timestamp);
    let merged = &merged[merged.len().saturating_sub(MERGED_WINDOW)..];
    let points = &merged[merged.len().saturating_sub(STRUCTURE_POINTS)..];

    if points.len() < STRUCTURE_POINTS {
        return Classification::NoStructure(NoStructure::InsufficientPoints(points.len()));
    }

    let Some(last) = annotated.last() else {
        return Classification::NoStructure(NoStructure::InsufficientPoints(0));
    };
    let current_price = last.candle.close;

    if points.iter().any(|p| !p.price.is_finite()) || !current_price.is_finite() {
        return Classification::NoStructure(NoStructure::Degenerate);
    }

    let first = points[0].price;
    let fifth = points[STRUCTURE_POINTS - 1].price;
    let trend = if first < fifth {
        Trend::Up
    } else if first > fifth {
        Trend::Down
    } else {
        return Classification::NoStructure(NoStructure::NoDirection);
    };

    let point_1 = StructurePoint::from(&points[0]);
    let point_2 = StructurePoint::from(&points[1]);
    let point_3 = StructurePoint::from(&points[2]);

    let wave_1_2_amplitude = (point_2.price - point_1.price).abs();
    if wave_1_2_amplitude == 0.0 {
        return Classification::NoStructure(NoStructure::Degenerate);
    }

    Classification::Found(WaveStructure {
        trend,
        point_1,
        point_2,
        point_3,
        wave_1_2_amplitude,
        current_price,
        fibonacci_levels: FibonacciLevels::compute(point_1.price, point_2.price, trend),
    })
}

fn trailing(mut points: Vec<SwingPoint>) -> Vec<SwingPoint> {
    let start = points.len().saturating_sub(TRAILING_SWINGS);
    points.drain(..start);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wave_core::provider::testing::{falling_staircase, rising_staircase, zigzag};
    use crate::wave_core::swings::{detect_swings, DEFAULT_LOOKBACK};

    fn prices(points: &[StructurePoint]) -> Vec<f64> {
        points.iter().map(|p| p.price).collect()
    }

    #[test]
    fn test_rising_staircase_is_uptrend() {
        let annotated = detect_swings(&rising_staircase(), DEFAULT_LOOKBACK);
        let Classification::Found(wave) = classify(&annotated) else {
            panic!("expected a structure");
        };

        assert_eq!(wave.trend, Trend::Up);
        assert_eq!(prices(&[wave.point_1, wave.point_2, wave.point_3]), vec![90.0, 140.0, 110.0]);
        assert_eq!(wave.wave_1_2_amplitude, 50.0);
        assert_eq!(wave.current_price, 115.5);
        assert!(wave.point_1.timestamp < wave.point_2.timestamp);
        assert!(wave.point_2.timestamp < wave.point_3.timestamp);
    }

    #[test]
    fn test_falling_staircase_is_downtrend() {
        let annotated = detect_swings(&falling_staircase(), DEFAULT_LOOKBACK);
        let wave = classify(&annotated).into_structure().unwrap();

        assert_eq!(wave.trend, Trend::Down);
        assert_eq!(prices(&[wave.point_1, wave.point_2, wave.point_3]), vec![210.0, 160.0, 190.0]);
        assert_eq!(wave.fibonacci_levels.wave_2_level("0.5"), Some(185.0));
    }

    #[test]
    fn test_too_few_swings() {
        // Two highs, two lows
        let pivots = [(0, 10.0), (10, 20.0), (20, 10.0), (30, 20.0), (40, 10.0), (50, 15.0)];
        let annotated = detect_swings(&zigzag(&pivots, 51), DEFAULT_LOOKBACK);

        assert_eq!(
            classify(&annotated),
            Classification::NoStructure(NoStructure::InsufficientSwings { highs: 2, lows: 2 })
        );
    }

    #[test]
    fn test_enough_highs_but_too_few_lows() {
        // Highs at 10, 30, 50; lows at 20, 40
        let pivots = [(0, 15.0), (10, 30.0), (20, 10.0), (30, 35.0), (40, 12.0), (50, 40.0), (60, 38.0)];
        let annotated = detect_swings(&zigzag(&pivots, 61), DEFAULT_LOOKBACK);

        assert_eq!(
            classify(&annotated),
            Classification::NoStructure(NoStructure::InsufficientSwings { highs: 3, lows: 2 })
        );
    }

    #[test]
    fn test_enough_lows_but_too_few_highs() {
        // Lows at 10, 30, 50; highs at 20, 40
        let pivots = [(0, 35.0), (10, 20.0), (20, 40.0), (30, 15.0), (40, 38.0), (50, 10.0), (60, 12.0)];
        let annotated = detect_swings(&zigzag(&pivots, 61), DEFAULT_LOOKBACK);

        assert_eq!(
            classify(&annotated),
            Classification::NoStructure(NoStructure::InsufficientSwings { highs: 2, lows: 3 })
        );
    }

    #[test]
    fn test_equal_first_and_fifth_point() {
        let pivots = [
            (0, 10.0),
            (10, 30.0),
            (20, 15.0),
            (30, 40.0),
            (40, 20.0),
            (50, 35.0),
            (60, 15.0),
            (70, 40.0),
            (80, 20.0),
            (90, 30.0),
        ];
        // Last five swings: 20, 35, 15, 40, 20
        let annotated = detect_swings(&zigzag(&pivots, 91), DEFAULT_LOOKBACK);

        assert_eq!(classify(&annotated), Classification::NoStructure(NoStructure::NoDirection));
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(
            classify(&[]),
            Classification::NoStructure(NoStructure::InsufficientSwings { highs: 0, lows: 0 })
        );
    }

    #[test]
    fn test_serialized_shape() {
        let annotated = detect_swings(&rising_staircase(), DEFAULT_LOOKBACK);
        let wave = classify(&annotated).into_structure().unwrap();
        let json = serde_json::to_value(&wave).unwrap();

        assert_eq!(json["trend"], "UP");
        assert_eq!(json["point_1"]["price"], 90.0);
        assert!(json["point_1"]["timestamp"].is_string());
        assert_eq!(json["wave_1_2_amplitude"], 50.0);
        assert_eq!(json["fibonacci_levels"]["wave_2"]["0.5"], 115.0);
    }
}
