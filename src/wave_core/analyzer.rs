//! Analysis service
//!
//! Runs the per-timeframe pipeline (fetch, swings, classification, signal)
//! and fans it out across the configured timeframes.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::candles::{Candle, Ticker};
use super::config::AnalyzerConfig;
use super::confluence::AggregateSummary;
use super::error::ProviderError;
use super::provider::MarketDataProvider;
use super::signals::{generate_signal, Signal};
use super::swings::detect_swings;
use super::waves::{classify, WaveStructure};

/// Analysis result for one timeframe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeframeAnalysis {
    pub timeframe: String,
    #[serde(rename = "fale")]
    pub structure: Option<WaveStructure>,
    #[serde(rename = "sygnal")]
    pub signal: Option<Signal>,
}

/// Results for every timeframe that could be fetched, plus their confluence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiTimeframeReport {
    pub results: Vec<TimeframeAnalysis>,
    pub summary: AggregateSummary,
}

/// Run swing detection, classification and signal generation on candles
pub fn analyze_candles(candles: &[Candle], timeframe: &str, lookback: usize) -> TimeframeAnalysis {
    let annotated = detect_swings(candles, lookback);
    let structure = classify(&annotated).into_structure();
    let signal = generate_signal(structure.as_ref(), timeframe);

    TimeframeAnalysis {
        timeframe: timeframe.to_string(),
        structure,
        signal,
    }
}

pub struct AnalysisService {
    provider: Arc<dyn MarketDataProvider>,
    config: AnalyzerConfig,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: AnalyzerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub async fn ticker(&self) -> Result<Ticker, ProviderError> {
        self.provider.fetch_ticker(&self.config.symbol).await
    }

    /// Fetch candles, treating an empty or non-finite series as unavailable
    pub async fn candles(&self, timeframe: &str, limit: usize) -> Result<Vec<Candle>, ProviderError> {
        let candles = self
            .provider
            .fetch_candles(&self.config.symbol, timeframe, limit)
            .await?;

        if candles.is_empty() {
            return Err(ProviderError::Empty(format!("{} {}", self.config.symbol, timeframe)));
        }
        if let Some(bad) = candles.iter().find(|c| !c.is_finite()) {
            return Err(ProviderError::Parse(format!(
                "non-finite candle at {} on {}",
                bad.timestamp, timeframe
            )));
        }

        debug!("Fetched {} candles for {} {}", candles.len(), self.config.symbol, timeframe);
        Ok(candles)
    }

    pub async fn analyze_timeframe(
        &self,
        timeframe: &str,
        limit: usize,
    ) -> Result<TimeframeAnalysis, ProviderError> {
        let candles = self.candles(timeframe, limit).await?;
        Ok(analyze_candles(&candles, timeframe, self.config.lookback))
    }

    /// Analyze every timeframe; fetch failures are logged and skipped
    pub async fn aggregate(&self, timeframes: &[String], limit: usize) -> MultiTimeframeReport {
        let outcomes = join_all(
            timeframes
                .iter()
                .map(|tf| self.analyze_timeframe(tf, limit)),
        )
        .await;

        let results: Vec<TimeframeAnalysis> = timeframes
            .iter()
            .zip(outcomes)
            .filter_map(|(tf, outcome)| match outcome {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    warn!("Skipping {} in aggregation: {}", tf, e);
                    None
                }
            })
            .collect();

        let summary = AggregateSummary::from_signals(results.iter().filter_map(|r| r.signal.as_ref()));

        MultiTimeframeReport { results, summary }
    }

    /// Aggregate across the configured timeframes
    pub async fn aggregate_configured(&self, limit: usize) -> MultiTimeframeReport {
        self.aggregate(&self.config.timeframes, limit).await
    }
}
