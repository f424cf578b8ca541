//! Fibonacci retracement and extension levels
//!
//! Wave 2 levels are retracements of the wave 1 move measured back from
//! point 2; the wave 3 level is a 1.414 extension from point 1.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::waves::Trend;

/// Wave 2 retracement ratios in scan order
pub const WAVE_2_RATIOS: [(&str, f64); 4] = [
    ("0.5", 0.5),
    ("0.618", 0.618),
    ("0.667", 0.667),
    ("1.0", 1.0),
];

/// Wave 3 extension ratio
pub const WAVE_3_RATIO: (&str, f64) = ("1.414", 1.414);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevel {
    pub label: &'static str,
    pub price: f64,
}

/// Levels keyed by ratio; serialized as `{"0.5": price, ...}` in emission order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibonacciLevels {
    #[serde(serialize_with = "serialize_levels")]
    pub wave_2: Vec<FibLevel>,
    #[serde(serialize_with = "serialize_levels")]
    pub wave_3: Vec<FibLevel>,
}

impl FibonacciLevels {
    /// Compute levels from the first two structure prices.
    ///
    /// Callers must reject non-finite prices and a zero wave 1 move first.
    pub fn compute(point_1: f64, point_2: f64, trend: Trend) -> Self {
        let wave_2 = WAVE_2_RATIOS
            .iter()
            .map(|&(label, ratio)| {
                let price = if ratio == 1.0 {
                    point_1
                } else {
                    match trend {
                        Trend::Up => point_2 - (point_2 - point_1) * ratio,
                        Trend::Down => point_2 + (point_1 - point_2) * ratio,
                    }
                };
                FibLevel { label, price }
            })
            .collect();

        let (label, ratio) = WAVE_3_RATIO;
        let extension = match trend {
            Trend::Up => point_1 + (point_2 - point_1) * ratio,
            Trend::Down => point_1 - (point_1 - point_2) * ratio,
        };

        Self {
            wave_2,
            wave_3: vec![FibLevel {
                label,
                price: extension,
            }],
        }
    }

    pub fn wave_2_level(&self, label: &str) -> Option<f64> {
        self.wave_2.iter().find(|l| l.label == label).map(|l| l.price)
    }

    /// The 1.414 wave 3 target
    pub fn wave_3_target(&self) -> f64 {
        self.wave_3[0].price
    }
}

fn serialize_levels<S: Serializer>(levels: &[FibLevel], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(levels.len()))?;
    for level in levels {
        map.serialize_entry(level.label, &level.price)?;
    }
    map.end()
}
