//! Market Round API
//!
//! Endpoints for the randomized investment game:
//! - GET /api/market - Current round catalog (outcomes hidden)
//! - POST /api/market/crypto - Stake on one of the round's memecoins
//! - POST /api/market/invest - Stake on one of the round's business stocks
//! - POST /api/market/settle - Settle the round and open the next one

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::services::MarketError;
use crate::types::{Investment, MarketClass, MarketView, SettlementReport};
use crate::AppState;

/// Create market router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_market))
        .route("/crypto", post(stake_crypto))
        .route("/invest", post(stake_business))
        .route("/settle", post(settle_round))
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

/// Convert MarketError to HTTP response.
impl IntoResponse for MarketError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            MarketError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            MarketError::UnknownOption { .. } => (StatusCode::BAD_REQUEST, "INVALID_INSTRUMENT"),
            MarketError::InsufficientFunds { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS")
            }
            MarketError::NoInvestments => (StatusCode::CONFLICT, "NO_INVESTMENTS"),
            MarketError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };

        // Storage failures surface a generic message; the detail goes to the log.
        let message = match &self {
            MarketError::DatabaseError(detail) => {
                error!("Market storage failure: {}", detail);
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
// Request Types
// =============================================================================

/// Identity comes from the chat platform, so every mutating request names
/// the acting user directly.
#[derive(Debug, Deserialize)]
pub struct StakeRequest {
    pub user_id: String,
    pub username: String,
    pub symbol: String,
    pub amount: f64,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/market
///
/// The current round's catalog. Opens round 1 on a fresh database.
async fn get_market(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MarketView>>, MarketError> {
    let view = state.market.market_view()?;
    Ok(Json(ApiResponse { data: view }))
}

/// POST /api/market/crypto
///
/// Stake play money on one of the round's memecoins.
async fn stake_crypto(
    State(state): State<AppState>,
    Json(request): Json<StakeRequest>,
) -> Result<Json<ApiResponse<Investment>>, MarketError> {
    let investment = state.market.stake(
        &request.user_id,
        &request.username,
        MarketClass::Crypto,
        &request.symbol,
        request.amount,
    )?;
    Ok(Json(ApiResponse { data: investment }))
}

/// POST /api/market/invest
///
/// Stake play money on one of the round's business stocks.
async fn stake_business(
    State(state): State<AppState>,
    Json(request): Json<StakeRequest>,
) -> Result<Json<ApiResponse<Investment>>, MarketError> {
    let investment = state.market.stake(
        &request.user_id,
        &request.username,
        MarketClass::Business,
        &request.symbol,
        request.amount,
    )?;
    Ok(Json(ApiResponse { data: investment }))
}

/// POST /api/market/settle
///
/// Settle the open round, credit payouts, and open the next round.
async fn settle_round(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SettlementReport>>, MarketError> {
    let report = state.market.settle()?;
    Ok(Json(ApiResponse { data: report }))
}
