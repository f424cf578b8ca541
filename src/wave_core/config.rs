//! Configuration for the analysis service

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::swings::DEFAULT_LOOKBACK;

/// Configuration for wave analysis and streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Traded pair in the provider's notation (e.g., "BTCUSDT")
    pub symbol: String,

    /// Timeframes analyzed by the aggregator, in report order
    pub timeframes: Vec<String>,

    /// Swing lookback period (bars on each side)
    pub lookback: usize,

    /// Candles fetched per REST analysis
    pub analysis_limit: usize,

    /// Candles fetched per streaming cycle
    pub stream_limit: usize,

    /// Candles served by the candles endpoint when no limit is given
    pub default_candle_limit: usize,

    /// Seconds between streaming cycles
    pub interval_secs: u64,

    /// Push one update immediately when a subscriber connects
    pub push_on_connect: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            timeframes: ["15m", "1h", "4h", "1D"].iter().map(|s| s.to_string()).collect(),
            lookback: DEFAULT_LOOKBACK,
            analysis_limit: 500,
            stream_limit: 200,
            default_candle_limit: 100,
            interval_secs: 30,
            push_on_connect: false,
        }
    }
}

impl AnalyzerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Parse a comma-separated timeframe list, dropping blanks
    pub fn parse_timeframes(list: &str) -> Vec<String> {
        list.split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}
