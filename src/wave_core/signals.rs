//! Signal generation from a wave structure
//!
//! Scans the wave 2 retracement levels in fixed order and fires on the first
//! one the current price sits within tolerance of. The signal targets the
//! wave 3 extension and stops at point 1.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ComputationError;
use super::waves::{Trend, WaveStructure};

/// Maximum deviation from a retracement level, in percent (exclusive)
pub const LEVEL_TOLERANCE_PCT: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub timeframe: String,
    pub trend: Trend,
    pub action: Option<Action>,
    pub reason: String,
    pub target: Option<f64>,
    pub stop: Option<f64>,
    pub risk_reward: Option<f64>,
}

impl Signal {
    fn neutral(timeframe: &str, trend: Trend, reason: String) -> Self {
        Self {
            timeframe: timeframe.to_string(),
            trend,
            action: None,
            reason,
            target: None,
            stop: None,
            risk_reward: None,
        }
    }
}

/// Percentage distance of `price` from `level`
pub fn deviation_pct(price: f64, level: f64) -> f64 {
    (price - level).abs() / level * 100.0
}

/// Reward distance over risk distance from the current price
pub fn risk_reward(current: f64, target: f64, stop: f64) -> Result<f64, ComputationError> {
    let risk = (current - stop).abs();
    if risk == 0.0 {
        return Err(ComputationError::DivisionByZero);
    }
    Ok((target - current).abs() / risk)
}

/// Generate a signal for one timeframe.
///
/// Returns `None` only when there is no structure; a structure without a
/// level in tolerance yields a signal with no action.
pub fn generate_signal(structure: Option<&WaveStructure>, timeframe: &str) -> Option<Signal> {
    let structure = structure?;
    let current = structure.current_price;
    let levels = &structure.fibonacci_levels;

    let hit = levels.wave_2.iter().find(|level| {
        let deviation = deviation_pct(current, level.price);
        deviation.is_finite() && deviation < LEVEL_TOLERANCE_PCT
    });

    let Some(level) = hit else {
        return Some(Signal::neutral(
            timeframe,
            structure.trend,
            "No Fibonacci retracement level within tolerance".to_string(),
        ));
    };

    let action = match structure.trend {
        Trend::Up => Action::Buy,
        Trend::Down => Action::Sell,
    };
    let target = levels.wave_3_target();
    let stop = structure.point_1.price;

    match risk_reward(current, target, stop) {
        Ok(rr) => Some(Signal {
            timeframe: timeframe.to_string(),
            trend: structure.trend,
            action: Some(action),
            reason: format!("Wave 2 correction at the {} Fibonacci level", level.label),
            target: Some(target),
            stop: Some(stop),
            risk_reward: Some(rr),
        }),
        Err(e) => {
            debug!("[{}] {} signal dropped: {}", timeframe, action, e);
            Some(Signal::neutral(
                timeframe,
                structure.trend,
                format!("Price sits on the stop at the {} level, no usable signal", level.label),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wave_core::fibonacci::FibonacciLevels;
    use crate::wave_core::waves::StructurePoint;
    use chrono::{Duration, TimeZone, Utc};

    fn structure(p1: f64, p2: f64, p3: f64, trend: Trend, current: f64) -> WaveStructure {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let point = |h: i64, price: f64| StructurePoint {
            timestamp: t0 + Duration::hours(h),
            price,
        };
        WaveStructure {
            trend,
            point_1: point(0, p1),
            point_2: point(10, p2),
            point_3: point(20, p3),
            wave_1_2_amplitude: (p2 - p1).abs(),
            current_price: current,
            fibonacci_levels: FibonacciLevels::compute(p1, p2, trend),
        }
    }

    #[test]
    fn test_no_structure_means_no_signal() {
        assert!(generate_signal(None, "1h").is_none());
    }

    #[test]
    fn test_buy_at_half_retracement() {
        // Levels: 0.5 -> 100, 0.618 -> 88.2, 0.667 -> 83.3, 1.0 -> 50
        let wave = structure(50.0, 150.0, 100.0, Trend::Up, 100.5);
        let signal = generate_signal(Some(&wave), "4h").unwrap();

        assert_eq!(signal.action, Some(Action::Buy));
        assert_eq!(signal.timeframe, "4h");
        assert_eq!(signal.target, Some(50.0 + 100.0 * 1.414));
        assert_eq!(signal.stop, Some(50.0));
        assert!(signal.reason.contains("0.5"));
        let expected_rr = (191.4 - 100.5) / 50.5;
        assert!((signal.risk_reward.unwrap() - expected_rr).abs() < 1e-9);
    }

    #[test]
    fn test_tolerance_boundary_is_exclusive() {
        let at_boundary = structure(50.0, 150.0, 100.0, Trend::Up, 101.5);
        let signal = generate_signal(Some(&at_boundary), "1h").unwrap();
        assert_eq!(signal.action, None);
        assert_eq!(signal.target, None);
        assert_eq!(signal.stop, None);
        assert_eq!(signal.risk_reward, None);
        assert_eq!(signal.trend, Trend::Up);

        let inside = structure(50.0, 150.0, 100.0, Trend::Up, 101.49);
        let signal = generate_signal(Some(&inside), "1h").unwrap();
        assert_eq!(signal.action, Some(Action::Buy));
    }

    #[test]
    fn test_deviation_divides_before_scaling() {
        let level = 509.89173460371455;
        let price = 517.5401106227703;
        assert_eq!(deviation_pct(price, level), 1.5);

        // 0.5 lands exactly on `level`; the other levels are far away
        let wave = structure(0.0, 2.0 * level, level, Trend::Up, price);
        let signal = generate_signal(Some(&wave), "1h").unwrap();
        assert_eq!(signal.action, None);
    }

    #[test]
    fn test_first_level_in_scan_order_wins() {
        // 0.5 -> 101.0, 0.618 -> 100.764: both within tolerance of 100.9
        let wave = structure(100.0, 102.0, 101.0, Trend::Up, 100.9);
        let signal = generate_signal(Some(&wave), "15m").unwrap();
        assert!(signal.reason.contains("0.5 "));
    }

    #[test]
    fn test_sell_in_downtrend() {
        // Levels: 0.5 -> 175, 0.618 -> 180.9; target 129.3, stop 200
        let wave = structure(200.0, 150.0, 180.0, Trend::Down, 180.0);
        let signal = generate_signal(Some(&wave), "1D").unwrap();

        assert_eq!(signal.action, Some(Action::Sell));
        assert!(signal.reason.contains("0.618"));
        assert_eq!(signal.stop, Some(200.0));
        let target = signal.target.unwrap();
        assert!((target - 129.3).abs() < 1e-9);
        let expected_rr = (180.0 - target) / (200.0 - 180.0);
        assert!((signal.risk_reward.unwrap() - expected_rr).abs() < 1e-9);
    }

    #[test]
    fn test_price_on_stop_downgrades_to_no_action() {
        // 0.5 -> 100.5 is within tolerance of 100.0, which is also the stop
        let wave = structure(100.0, 101.0, 100.5, Trend::Up, 100.0);
        let signal = generate_signal(Some(&wave), "1h").unwrap();

        assert_eq!(signal.action, None);
        assert_eq!(signal.risk_reward, None);
    }

    #[test]
    fn test_risk_reward_division_by_zero() {
        assert_eq!(risk_reward(100.0, 150.0, 100.0), Err(ComputationError::DivisionByZero));
        assert_eq!(risk_reward(100.0, 150.0, 90.0), Ok(5.0));
    }

    #[test]
    fn test_zero_level_never_matches() {
        assert!(!deviation_pct(0.0, 0.0).is_finite());
        assert!(!deviation_pct(1.0, 0.0).is_finite());
    }

    #[test]
    fn test_serialized_shape() {
        let wave = structure(50.0, 150.0, 100.0, Trend::Up, 120.0);
        let json = serde_json::to_value(generate_signal(Some(&wave), "1h").unwrap()).unwrap();

        assert_eq!(json["trend"], "UP");
        assert!(json["action"].is_null());
        assert!(json["target"].is_null());
    }
}
