// Library crate - exports the analysis core, provider client and transport

pub mod api;
pub mod bybit;
pub mod streams;
pub mod types;
pub mod wave_core;

// Re-export commonly used types
pub use types::*;
pub use wave_core::{AnalysisService, AnalyzerConfig};
