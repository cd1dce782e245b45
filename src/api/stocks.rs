//! Stock Browsing API
//!
//! Read-only stock lookups outside the trading flow:
//! - GET /api/stocks/price/:symbol - Quote for one symbol
//! - GET /api/stocks/browse/:category - Category listing with prices
//! - GET /api/stocks/wisdom - A random piece of trading wisdom

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use rand::Rng;
use serde::Serialize;

use crate::error::AppError;
use crate::types::Quote;
use crate::AppState;

/// Create stocks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/price/:symbol", get(get_price))
        .route("/browse/:category", get(browse_category))
        .route("/wisdom", get(get_wisdom))
}

/// Symbols priced per browse request; the rest are reported as a count.
const BROWSE_PRICE_LIMIT: usize = 12;

/// Browseable categories: (key, display name, tickers).
const STOCK_CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "popular",
        "Popular Stocks",
        &[
            "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX", "V", "JPM",
        ],
    ),
    (
        "tech",
        "Tech Giants",
        &[
            "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "NFLX", "ADBE", "CRM", "INTC",
            "AMD", "QCOM", "IBM",
        ],
    ),
    (
        "finance",
        "Banking & Finance",
        &[
            "JPM", "BAC", "WFC", "GS", "MS", "V", "MA", "AXP", "C", "USB", "PNC", "TFC",
        ],
    ),
    (
        "energy",
        "Energy & Oil",
        &[
            "XOM", "CVX", "COP", "EOG", "SLB", "MPC", "VLO", "PSX", "KMI", "OKE", "WMB", "EPD",
        ],
    ),
    (
        "healthcare",
        "Healthcare",
        &[
            "JNJ", "UNH", "PFE", "ABT", "TMO", "LLY", "MRK", "ABBV", "BMY", "AMGN", "GILD", "CVS",
        ],
    ),
    (
        "consumer",
        "Consumer Goods",
        &[
            "WMT", "PG", "KO", "PEP", "COST", "HD", "LOW", "SBUX", "MCD", "NKE", "TGT", "DIS",
        ],
    ),
    (
        "industrial",
        "Industrial",
        &[
            "CAT", "HON", "UNP", "MMM", "GE", "BA", "RTX", "LMT", "DE", "EMR", "ITW", "PH",
        ],
    ),
    (
        "alpha_am",
        "Alphabetical A-M",
        &[
            "AAPL", "ABBV", "ABT", "ACN", "ADBE", "AMD", "AMGN", "AMZN", "AXP", "BA", "BAC",
            "BMY", "C", "CAT", "CRM", "CVS", "CVX", "DHR", "DIS", "EMR", "EOG", "GE", "GILD",
            "GOOGL", "GS", "HD", "HON", "IBM", "INTC", "ITW", "JNJ", "JPM", "KMI", "KO", "LIN",
            "LLY", "LMT", "LOW", "MA", "MCD", "META", "MMM", "MPC", "MRK", "MS", "MSFT",
        ],
    ),
    (
        "alpha_nz",
        "Alphabetical N-Z",
        &[
            "NEE", "NFLX", "NKE", "NVDA", "OKE", "PEP", "PFE", "PG", "PH", "PNC", "PSX", "PYPL",
            "QCOM", "RTX", "SBUX", "SLB", "T", "TFC", "TGT", "TMO", "TSLA", "TXN", "UNH", "UNP",
            "USB", "V", "VLO", "VZ", "WFC", "WMB", "WMT", "XOM",
        ],
    ),
];

/// Trading wisdom, served one haiku at a time.
const TRADING_HAIKUS: &[&str] = &[
    "Market waves rise, fall\nPatience brings inner profit\nMoney flows like streams",
    "Cherry blossoms bloom\nStock prices dance with the wind\nWisdom in waiting",
    "Mountain stands so tall\nYour portfolio grows with time\nRocks do not worry",
    "Morning dew glistens\nInvestments need time to grow\nSunrise brings new hope",
    "River flows steadfast\nThrough valleys of gain and loss\nCurrent guides the way",
    "Bamboo bends, not breaks\nFlexible minds make profit\nStorm clouds always pass",
    "Silent pond reflects\nMarket's face in still water\nRipples show the truth",
    "Snowflake lands softly\nEach trade unique, yet fragile\nMelts into the whole",
    "Moon phases cycle\nBull and bear markets return\nNature knows balance",
    "Rain nourishes earth\nLosses water future gains\nSeasons teach us well",
    "Turtle moves slowly\nSteady wins the longest race\nHaste brings only loss",
    "Lotus blooms in mud\nBeauty rises from darkness\nGrowth through adversity",
];

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// One category with quotes for its leading symbols.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListing {
    pub category: String,
    pub name: String,
    pub quotes: Vec<Quote>,
    /// Symbols in the category beyond the priced ones
    pub more: usize,
}

#[derive(Debug, Serialize)]
pub struct WisdomResponse {
    pub haiku: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/stocks/price/:symbol
async fn get_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Json<ApiResponse<Quote>> {
    let quote = state.quotes.get_quote(&symbol).await;
    Json(ApiResponse { data: quote })
}

/// GET /api/stocks/browse/:category
///
/// Prices the first few symbols of a category; the remainder is a count so
/// one request cannot fan out across an entire category list.
async fn browse_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<CategoryListing>>, AppError> {
    let &(key, name, symbols) = STOCK_CATEGORIES
        .iter()
        .find(|(key, _, _)| *key == category)
        .ok_or_else(|| AppError::NotFound(format!("Unknown category: {}", category)))?;

    let mut quotes = Vec::new();
    for symbol in symbols.iter().take(BROWSE_PRICE_LIMIT) {
        quotes.push(state.quotes.get_quote(symbol).await);
    }

    Ok(Json(ApiResponse {
        data: CategoryListing {
            category: key.to_string(),
            name: name.to_string(),
            quotes,
            more: symbols.len().saturating_sub(BROWSE_PRICE_LIMIT),
        },
    }))
}

/// GET /api/stocks/wisdom
async fn get_wisdom() -> Json<ApiResponse<WisdomResponse>> {
    let haiku = {
        let mut rng = rand::thread_rng();
        TRADING_HAIKUS[rng.gen_range(0..TRADING_HAIKUS.len())]
    };
    Json(ApiResponse {
        data: WisdomResponse {
            haiku: haiku.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_unique_and_nonempty() {
        let mut keys: Vec<&str> = STOCK_CATEGORIES.iter().map(|(key, _, _)| *key).collect();
        keys.sort_unstable();
        let before = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), before);

        for (key, name, symbols) in STOCK_CATEGORIES {
            assert!(!key.is_empty());
            assert!(!name.is_empty());
            assert!(!symbols.is_empty());
        }
    }

    #[test]
    fn test_category_lookup() {
        assert!(STOCK_CATEGORIES.iter().any(|(key, _, _)| *key == "tech"));
        assert!(STOCK_CATEGORIES.iter().any(|(key, _, _)| *key == "alpha_nz"));
        assert!(!STOCK_CATEGORIES.iter().any(|(key, _, _)| *key == "bonds"));
    }

    #[test]
    fn test_haikus_have_three_lines() {
        for haiku in TRADING_HAIKUS {
            assert_eq!(haiku.lines().count(), 3);
        }
    }

    #[test]
    fn test_category_listing_serialization() {
        let listing = CategoryListing {
            category: "tech".to_string(),
            name: "Tech Giants".to_string(),
            quotes: vec![],
            more: 1,
        };

        let json = serde_json::to_string(&listing).unwrap();
        assert!(json.contains("\"category\":\"tech\""));
        assert!(json.contains("\"more\":1"));
    }

    #[tokio::test]
    async fn test_wisdom_serves_a_haiku() {
        let Json(response) = get_wisdom().await;
        assert!(TRADING_HAIKUS.contains(&response.data.haiku.as_str()));
    }
}
