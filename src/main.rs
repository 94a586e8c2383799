use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use weather_gateway::{
    Args, Gateway, app,
    clock::SystemClock,
    history::HistoryStore,
    state::AppState,
    upstream::OpenWeatherClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_new(&args.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = args.gateway_config();
    if config.api_key.is_none() {
        tracing::warn!("OPENWEATHER_API_KEY is not set; /weather will answer 500");
    }

    let upstream = OpenWeatherClient::new(args.upstream_url.clone(), args.upstream_timeout())
        .context("failed to build upstream HTTP client")?;

    let history = HistoryStore::open(&args.history_path).with_context(|| {
        format!("failed to open history store at {}", args.history_path.display())
    })?;

    // creating shared state
    let state = Arc::new(AppState::new(Gateway::new(
        config.clone(),
        Arc::new(upstream),
        Arc::new(history),
        Arc::new(SystemClock),
    )));

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Gateway running on http://{}", addr);
    tracing::info!("Forwarding to {}", args.upstream_url);
    tracing::info!(
        "Rate limit: {} requests per minute per caller, {} per UTC day overall",
        config.rate_limit,
        config.daily_limit
    );
    if config.tokens.is_empty() {
        tracing::info!("No PROXY_TOKENS configured; authentication disabled");
    } else {
        tracing::info!("Authentication enabled ({} tokens)", config.tokens.len());
    }

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
