//! Candle and ticker types for the wave core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle as returned by the market data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Candle with all four prices set to the same value
    pub fn flat(timestamp: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Candle shape served by `/api/candles/{timeframe}` (time in unix seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartCandle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<&Candle> for ChartCandle {
    fn from(c: &Candle) -> Self {
        Self {
            time: c.timestamp.timestamp(),
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        }
    }
}

/// 24h ticker snapshot for the traded symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    /// 24h volume in the quote currency
    pub quote_volume_24h: f64,
    /// 24h change in percent
    pub change_24h_pct: f64,
}
