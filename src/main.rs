use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

use wave_signals::{
    api,
    bybit::{BybitClient, MAINNET_BASE_URL},
    streams::{BroadcastScheduler, SubscriberRegistry},
    AnalysisService, AnalyzerConfig, AppState,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Trading pair in Bybit notation
    #[arg(short, long, env = "WAVE_SYMBOL", default_value = "BTCUSDT")]
    symbol: String,

    /// Timeframes to analyze (comma-separated)
    #[arg(short, long, env = "WAVE_TIMEFRAMES", default_value = "15m,1h,4h,1D")]
    timeframes: String,

    /// Host to bind the web server on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to run the web server on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Swing lookback (bars on each side)
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u16).range(1..))]
    lookback: u16,

    /// Candles fetched per REST analysis
    #[arg(long, default_value = "500")]
    analysis_limit: usize,

    /// Candles fetched per streaming cycle
    #[arg(long, default_value = "200")]
    stream_limit: usize,

    /// Seconds between streaming updates
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,

    /// Send an update as soon as a client subscribes
    #[arg(long)]
    push_on_connect: bool,

    /// Bybit market category (spot, linear, inverse)
    #[arg(long, env = "BYBIT_CATEGORY", default_value = "spot")]
    category: String,

    /// Bybit REST base URL
    #[arg(long, env = "BYBIT_BASE_URL", default_value = MAINNET_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wave_signals=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = AnalyzerConfig {
        symbol: args.symbol.clone(),
        timeframes: AnalyzerConfig::parse_timeframes(&args.timeframes),
        lookback: args.lookback as usize,
        analysis_limit: args.analysis_limit,
        stream_limit: args.stream_limit,
        interval_secs: args.interval_secs,
        push_on_connect: args.push_on_connect,
        ..Default::default()
    };

    info!("Starting Wave Signals server");
    info!("Symbol: {}", config.symbol);
    info!("Timeframes: {:?}", config.timeframes);
    info!("Lookback: {}", config.lookback);
    info!("Stream interval: {}s", config.interval_secs);

    let provider = BybitClient::new(&args.base_url, &args.category)
        .context("Failed to create Bybit client")?;
    info!("Market data: Bybit {} ({})", args.category, args.base_url);

    let service = Arc::new(AnalysisService::new(Arc::new(provider), config));
    let registry = Arc::new(SubscriberRegistry::new());
    let scheduler = Arc::new(BroadcastScheduler::new(service.clone(), registry));

    let state = Arc::new(AppState { service, scheduler });
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid host/port")?;
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
