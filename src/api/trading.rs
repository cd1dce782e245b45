//! Trading API
//!
//! Endpoints for the paper stock-trading game:
//!
//! Trades:
//! - POST /api/trading/buy - Market-buy shares at the current quote
//! - POST /api/trading/sell - Market-sell shares at the current quote
//!
//! Views:
//! - GET /api/trading/portfolio - Holdings, cash, and pending round stakes
//! - GET /api/trading/funds - Cash and holdings value summary
//! - GET /api/trading/rankings - Rankings board by total value
//! - GET /api/trading/history - Recent trades, newest first

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::services::TradingError;
use crate::types::{
    FundsView, PortfolioView, RankingEntry, TradeReceipt, TransactionRecord,
};
use crate::AppState;

/// Create trading router.
pub fn router() -> Router<AppState> {
    Router::new()
        // Trade routes
        .route("/buy", post(buy_stock))
        .route("/sell", post(sell_stock))
        // View routes
        .route("/portfolio", get(get_portfolio))
        .route("/funds", get(get_funds))
        .route("/rankings", get(get_rankings))
        .route("/history", get(get_history))
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Convert TradingError to HTTP response.
impl IntoResponse for TradingError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            TradingError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, "INVALID_QUANTITY"),
            TradingError::InsufficientFunds { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS")
            }
            TradingError::InsufficientShares { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_SHARES")
            }
            TradingError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };

        // Storage failures surface a generic message; the detail goes to the log.
        let message = match &self {
            TradingError::DatabaseError(detail) => {
                error!("Trading storage failure: {}", detail);
                "Storage error, try again later".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

// =============================================================================
// Request & Query Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub user_id: String,
    pub username: String,
    pub symbol: String,
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct RankingsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: String,
    pub limit: Option<i64>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/trading/buy
async fn buy_stock(
    State(state): State<AppState>,
    Json(request): Json<TradeRequest>,
) -> Result<Json<ApiResponse<TradeReceipt>>, TradingError> {
    let receipt = state
        .trading
        .buy(
            &request.user_id,
            &request.username,
            &request.symbol,
            request.quantity,
        )
        .await?;
    Ok(Json(ApiResponse { data: receipt }))
}

/// POST /api/trading/sell
async fn sell_stock(
    State(state): State<AppState>,
    Json(request): Json<TradeRequest>,
) -> Result<Json<ApiResponse<TradeReceipt>>, TradingError> {
    let receipt = state
        .trading
        .sell(
            &request.user_id,
            &request.username,
            &request.symbol,
            request.quantity,
        )
        .await?;
    Ok(Json(ApiResponse { data: receipt }))
}

/// GET /api/trading/portfolio
async fn get_portfolio(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<PortfolioView>>, TradingError> {
    let view = state
        .trading
        .portfolio(&query.user_id, &query.username)
        .await?;
    Ok(Json(ApiResponse { data: view }))
}

/// GET /api/trading/funds
async fn get_funds(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<FundsView>>, TradingError> {
    let funds = state.trading.funds(&query.user_id, &query.username).await?;
    Ok(Json(ApiResponse { data: funds }))
}

/// GET /api/trading/rankings
async fn get_rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingsQuery>,
) -> Result<Json<ApiResponse<Vec<RankingEntry>>>, TradingError> {
    let limit = query.limit.unwrap_or(10);
    let rankings = state.trading.rankings(limit).await?;
    Ok(Json(ApiResponse { data: rankings }))
}

/// GET /api/trading/history
async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<TransactionRecord>>>, TradingError> {
    let limit = query.limit.unwrap_or(10);
    let history = state.trading.history(&query.user_id, limit)?;
    Ok(Json(ApiResponse { data: history }))
}
