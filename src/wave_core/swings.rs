//! Swing high / swing low detection
//!
//! A candle is a swing high when its high equals the maximum high over the
//! closed window `[i - lookback, i + lookback]`, and a swing low when its low
//! equals the minimum low over the same window. Candles closer than
//! `lookback` to either end of the series are never marked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candles::Candle;

/// Default swing lookback period (bars on each side)
pub const DEFAULT_LOOKBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed local extreme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
}

/// Candle plus its swing annotation for one analysis pass
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedCandle {
    pub candle: Candle,
    pub swing_high: bool,
    pub swing_low: bool,
}

impl AnnotatedCandle {
    pub fn swing_high_point(&self) -> Option<SwingPoint> {
        self.swing_high.then(|| SwingPoint {
            timestamp: self.candle.timestamp,
            price: self.candle.high,
            kind: SwingKind::High,
        })
    }

    pub fn swing_low_point(&self) -> Option<SwingPoint> {
        self.swing_low.then(|| SwingPoint {
            timestamp: self.candle.timestamp,
            price: self.candle.low,
            kind: SwingKind::Low,
        })
    }
}

/// Annotate every candle with its swing high / swing low flags.
///
/// Ties are not broken: several candles sharing the window extreme are all
/// marked.
pub fn detect_swings(candles: &[Candle], lookback: usize) -> Vec<AnnotatedCandle> {
    let mut annotated: Vec<AnnotatedCandle> = candles
        .iter()
        .map(|c| AnnotatedCandle {
            candle: c.clone(),
            swing_high: false,
            swing_low: false,
        })
        .collect();

    if lookback == 0 || candles.len() <= lookback.saturating_mul(2) {
        return annotated;
    }

    for i in lookback..candles.len() - lookback {
        let window = &candles[i - lookback..=i + lookback];

        let max_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let min_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);

        annotated[i].swing_high = candles[i].high == max_high;
        annotated[i].swing_low = candles[i].low == min_low;
    }

    annotated
}
