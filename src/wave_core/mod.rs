//! Wave Core - analytical pipeline shared by the REST API and the stream
//!
//! This module contains the analysis components:
//! - Swing high / swing low detection
//! - Wave structure classification
//! - Fibonacci retracement and extension levels
//! - Signal generation
//! - Multi-timeframe confluence
//! - The analysis service that drives them from a market data provider

pub mod analyzer;
pub mod candles;
pub mod config;
pub mod confluence;
pub mod error;
pub mod fibonacci;
pub mod provider;
pub mod signals;
pub mod swings;
pub mod waves;

// Re-export commonly used types
pub use analyzer::{analyze_candles, AnalysisService, MultiTimeframeReport, TimeframeAnalysis};
pub use candles::{Candle, ChartCandle, Ticker};
pub use config::AnalyzerConfig;
pub use confluence::AggregateSummary;
pub use error::{ComputationError, ProviderError};
pub use fibonacci::{FibLevel, FibonacciLevels};
pub use provider::MarketDataProvider;
pub use signals::{generate_signal, Action, Signal};
pub use swings::{detect_swings, AnnotatedCandle, SwingKind, SwingPoint, DEFAULT_LOOKBACK};
pub use waves::{classify, Classification, NoStructure, StructurePoint, Trend, WaveStructure};
