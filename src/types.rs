use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::streams::BroadcastScheduler;
use crate::wave_core::{AnalysisService, TimeframeAnalysis};

/// Messages pushed over the WebSocket stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsMessage {
    Connected {
        symbol: String,
        timeframes: Vec<String>,
    },
    Update {
        price: f64,
        analysis: Vec<TimeframeAnalysis>,
        timestamp: DateTime<Utc>,
    },
}

/// Shared application state
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub scheduler: Arc<BroadcastScheduler>,
}
