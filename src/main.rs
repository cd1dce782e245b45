use axum::Router;
use moonbag::api;
use moonbag::config::Config;
use moonbag::services::{MarketService, QuoteService, SqliteStore, TradingService};
use moonbag::AppState;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moonbag=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Moonbag server on {}:{}", config.host, config.port);

    // Open the database, creating its directory on first run
    if let Some(parent) = Path::new(&config.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = Arc::new(SqliteStore::new(&config.database_path)?);

    // Build the services
    let quotes = Arc::new(QuoteService::new(
        store.clone(),
        config.alpha_vantage_api_key.clone(),
        Duration::from_secs(config.quote_timeout_secs),
    ));
    let market = Arc::new(MarketService::new(store.clone(), config.starting_balance));
    let trading = Arc::new(TradingService::new(
        store.clone(),
        quotes.clone(),
        config.starting_balance,
    ));

    // Make sure a round is open before the first request arrives
    let round = market.ensure_open_round()?;
    info!(
        "Round {} is open (mood: {})",
        round.round_number, round.mood
    );

    // Create application state
    let state = AppState {
        config: config.clone(),
        store,
        quotes,
        market,
        trading,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Moonbag server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
