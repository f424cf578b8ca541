//! Bybit API Integration
//!
//! Market data provider backed by the public Bybit v5 REST API.
//!
//! # Components
//!
//! - [`client`] - HTTP client implementing `MarketDataProvider`
//! - [`models`] - Response data types
//!
//! # API Endpoints Used
//!
//! - `GET /v5/market/kline` - OHLCV candles (newest first)
//! - `GET /v5/market/tickers` - 24h ticker

pub mod client;
pub mod models;

pub use client::{interval_code, BybitClient, MAINNET_BASE_URL};
