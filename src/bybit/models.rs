//! Bybit API Data Models
//!
//! Response types for the public Bybit v5 market endpoints.

use serde::Deserialize;

/// Common v5 response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

// ============================================================================
// Klines
// ============================================================================

/// `GET /v5/market/kline` result
#[derive(Debug, Deserialize)]
pub struct KlineResult {
    /// Rows of `[startTime, open, high, low, close, volume, turnover]`,
    /// newest first, all as strings
    #[serde(default)]
    pub list: Vec<Vec<String>>,
}

// ============================================================================
// Tickers
// ============================================================================

/// `GET /v5/market/tickers` result
#[derive(Debug, Deserialize)]
pub struct TickerResult {
    #[serde(default)]
    pub list: Vec<TickerRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerRow {
    pub symbol: String,
    pub last_price: String,
    #[serde(rename = "highPrice24h")]
    pub high_price_24h: String,
    #[serde(rename = "lowPrice24h")]
    pub low_price_24h: String,
    /// 24h volume in the quote currency
    #[serde(rename = "turnover24h")]
    pub turnover_24h: String,
    /// 24h change as a fraction (0.0123 = 1.23%)
    #[serde(rename = "price24hPcnt")]
    pub price_24h_pcnt: String,
}
