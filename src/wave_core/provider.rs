//! Market data provider seam
//!
//! The wave core never talks to an exchange directly. Anything that can
//! return ordered candles and a ticker for a symbol can drive the analysis.

use async_trait::async_trait;

use super::candles::{Candle, Ticker};
use super::error::ProviderError;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch up to `limit` candles for `timeframe`, ordered by timestamp ascending
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError>;

    /// Fetch the current 24h ticker
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ProviderError>;
}
