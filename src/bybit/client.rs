//! Bybit API Client
//!
//! HTTP client for the public Bybit v5 market data endpoints. No
//! authentication is needed for klines or tickers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::models::*;
use crate::wave_core::{Candle, MarketDataProvider, ProviderError, Ticker};

/// Mainnet base URL
pub const MAINNET_BASE_URL: &str = "https://api.bybit.com";

/// Largest page the kline endpoint returns
pub const MAX_KLINE_LIMIT: usize = 1000;

/// Raw interval codes accepted by the kline endpoint
const RAW_INTERVALS: [&str; 13] = [
    "1", "3", "5", "15", "30", "60", "120", "240", "360", "720", "D", "W", "M",
];

/// Map a timeframe such as "15m", "4h" or "1D" to a Bybit interval code
pub fn interval_code(timeframe: &str) -> Option<&'static str> {
    let code = match timeframe {
        "1m" => "1",
        "3m" => "3",
        "5m" => "5",
        "15m" => "15",
        "30m" => "30",
        "1h" | "1H" => "60",
        "2h" | "2H" => "120",
        "4h" | "4H" => "240",
        "6h" | "6H" => "360",
        "12h" | "12H" => "720",
        "1d" | "1D" => "D",
        "1w" | "1W" => "W",
        "1M" => "M",
        raw => return RAW_INTERVALS.iter().copied().find(|c| *c == raw),
    };
    Some(code)
}

/// Bybit market data client
pub struct BybitClient {
    client: Client,
    base_url: String,
    category: String,
}

impl BybitClient {
    /// Create a client for `category` ("spot", "linear", ...)
    pub fn new(base_url: impl Into<String>, category: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            category: category.into(),
        })
    }

    /// Make a GET request and unwrap the v5 envelope
    async fn get<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<R, ProviderError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, endpoint))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        let envelope: Envelope<R> = response.json().await?;
        if envelope.ret_code != 0 {
            return Err(ProviderError::Api {
                code: envelope.ret_code,
                message: envelope.ret_msg,
            });
        }

        envelope
            .result
            .ok_or_else(|| ProviderError::Parse(format!("{} returned no result", endpoint)))
    }
}

#[async_trait]
impl MarketDataProvider for BybitClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let interval = interval_code(timeframe)
            .ok_or_else(|| ProviderError::UnsupportedTimeframe(timeframe.to_string()))?;
        let limit = limit.clamp(1, MAX_KLINE_LIMIT);

        debug!("GET kline {} {} (interval {}, limit {})", symbol, timeframe, interval, limit);

        let result: KlineResult = self
            .get(
                "/v5/market/kline",
                &[
                    ("category", self.category.clone()),
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        parse_kline_rows(&result.list)
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ProviderError> {
        let result: TickerResult = self
            .get(
                "/v5/market/tickers",
                &[
                    ("category", self.category.clone()),
                    ("symbol", symbol.to_string()),
                ],
            )
            .await?;

        let row = result
            .list
            .first()
            .ok_or_else(|| ProviderError::Empty(symbol.to_string()))?;
        parse_ticker(row)
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, ProviderError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| ProviderError::Parse(format!("{} is not a number: {:?}", field, raw)))?;
    if !value.is_finite() {
        return Err(ProviderError::Parse(format!("{} is not finite: {:?}", field, raw)));
    }
    Ok(value)
}

/// Convert newest-first kline rows into ascending candles without duplicate timestamps
pub fn parse_kline_rows(rows: &[Vec<String>]) -> Result<Vec<Candle>, ProviderError> {
    let mut candles = rows
        .iter()
        .map(|row| {
            if row.len() < 6 {
                return Err(ProviderError::Parse(format!("short kline row: {:?}", row)));
            }
            let millis: i64 = row[0]
                .parse()
                .map_err(|_| ProviderError::Parse(format!("bad kline start time: {:?}", row[0])))?;
            let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
                .ok_or_else(|| ProviderError::Parse(format!("kline start time out of range: {}", millis)))?;

            Ok(Candle {
                timestamp,
                open: parse_number("open", &row[1])?,
                high: parse_number("high", &row[2])?,
                low: parse_number("low", &row[3])?,
                close: parse_number("close", &row[4])?,
                volume: parse_number("volume", &row[5])?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
    Ok(candles)
}

pub fn parse_ticker(row: &TickerRow) -> Result<Ticker, ProviderError> {
    Ok(Ticker {
        symbol: row.symbol.clone(),
        last: parse_number("lastPrice", &row.last_price)?,
        high_24h: parse_number("highPrice24h", &row.high_price_24h)?,
        low_24h: parse_number("lowPrice24h", &row.low_price_24h)?,
        quote_volume_24h: parse_number("turnover24h", &row.turnover_24h)?,
        change_24h_pct: parse_number("price24hPcnt", &row.price_24h_pcnt)? * 100.0,
    })
}
