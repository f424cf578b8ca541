use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::types::{AppState, WsMessage};
use crate::wave_core::{AggregateSummary, ChartCandle, ProviderError, TimeframeAnalysis};

/// Response for the candles endpoint
#[derive(Serialize)]
pub struct CandlesResponse {
    pub timeframe: String,
    pub candles: Vec<ChartCandle>,
}

/// Response for the multi-timeframe analysis endpoint
#[derive(Serialize)]
pub struct AllAnalysisResponse {
    pub results: Vec<TimeframeAnalysis>,
    pub summary: AggregateSummary,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Query params for candles endpoint
#[derive(Debug, Deserialize)]
pub struct CandlesQueryParams {
    pub limit: Option<usize>,
}

/// Build the HTTP + WebSocket router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/price", get(get_price))
        .route("/api/candles/{timeframe}", get(get_candles))
        .route("/api/analysis/all", get(get_all_analysis))
        .route("/api/analysis/{timeframe}", get(get_analysis))
        .route("/ws", get(ws_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn provider_failure(context: &str, e: ProviderError) -> (StatusCode, Json<serde_json::Value>) {
    error!("{} failed: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
}

/// GET / - Health check
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "online",
        "service": "Wave Signals API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/price - Current ticker for the configured symbol
pub async fn get_price(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.service.ticker().await {
        Ok(ticker) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "symbol": state.service.symbol(),
                "price": ticker.last,
                "high_24h": ticker.high_24h,
                "low_24h": ticker.low_24h,
                "volume_24h": ticker.quote_volume_24h,
                "change_24h": ticker.change_24h_pct,
                "timestamp": Utc::now(),
            })),
        ),
        Err(e) => provider_failure("Ticker fetch", e),
    }
}

/// GET /api/candles/{timeframe} - Chart candles
pub async fn get_candles(
    State(state): State<Arc<AppState>>,
    Path(timeframe): Path<String>,
    Query(params): Query<CandlesQueryParams>,
) -> impl IntoResponse {
    let limit = params
        .limit
        .unwrap_or(state.service.config().default_candle_limit);

    match state.service.candles(&timeframe, limit).await {
        Ok(candles) => (
            StatusCode::OK,
            Json(serde_json::json!(CandlesResponse {
                candles: candles.iter().map(ChartCandle::from).collect(),
                timeframe,
            })),
        ),
        Err(e) => provider_failure(&format!("Candles {}", timeframe), e),
    }
}

/// GET /api/analysis/{timeframe} - Wave structure and signal for one timeframe
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(timeframe): Path<String>,
) -> impl IntoResponse {
    let limit = state.service.config().analysis_limit;

    match state.service.analyze_timeframe(&timeframe, limit).await {
        Ok(analysis) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "timeframe": analysis.timeframe,
                "fale": analysis.structure,
                "sygnal": analysis.signal,
                "timestamp": Utc::now(),
            })),
        ),
        Err(e) => provider_failure(&format!("Analysis {}", timeframe), e),
    }
}

/// GET /api/analysis/all - Every configured timeframe plus confluence
pub async fn get_all_analysis(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let limit = state.service.config().analysis_limit;
    let report = state.service.aggregate_configured(limit).await;

    Json(AllAnalysisResponse {
        results: report.results,
        summary: report.summary,
        timestamp: Utc::now(),
    })
}

/// GET /ws - Periodic analysis stream
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let welcome = WsMessage::Connected {
        symbol: state.service.symbol().to_string(),
        timeframes: state.service.config().timeframes.clone(),
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    let subscription = state.scheduler.subscribe().await;
    let id = subscription.id;
    let mut updates = subscription.updates;

    // Forward scheduler updates to this client
    let send_task = tokio::spawn(async move {
        while let Some(msg) = updates.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Drain incoming frames until the client goes away
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.scheduler.unsubscribe(id).await;
    info!("WebSocket client {} disconnected", id);
}
