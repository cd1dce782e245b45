//! Moonbag - Chat-platform trading game server
//!
//! Paper stock trading at live-or-synthetic prices, plus a randomized
//! market-round investment game with predetermined outcomes, all backed by
//! one SQLite database. The chat bot is a client of the HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use config::Config;
use services::{MarketService, QuoteService, SqliteStore, TradingService};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SqliteStore>,
    pub quotes: Arc<QuoteService>,
    pub market: Arc<MarketService>,
    pub trading: Arc<TradingService>,
}
