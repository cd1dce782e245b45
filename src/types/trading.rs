//! Trading Types
//!
//! Types for the paper stock-trading game: holdings with weighted-average
//! entry prices, the trade log, receipts, and portfolio views.

use serde::{Deserialize, Serialize};

use crate::types::market::MarketClass;

// =============================================================================
// Enums
// =============================================================================

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(format!("unknown trade action: {}", other)),
        }
    }
}

// =============================================================================
// Holdings
// =============================================================================

/// A user's position in one symbol. `avg_price` is the weighted average
/// across all buys still open; sells realize P/L against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub user_id: String,
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
}

impl Holding {
    /// Cost basis of the open position.
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.avg_price
    }
}

/// A holding priced at the current quote, for portfolio display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedHolding {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_pct: f64,
}

// =============================================================================
// Trade log
// =============================================================================

/// One executed trade, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: i64,
    pub user_id: String,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: f64,
    pub price: f64,
    pub total: f64,
    pub created_at: i64,
}

/// What a buy or sell returns to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReceipt {
    pub action: TradeAction,
    pub symbol: String,
    pub quantity: f64,
    /// Execution price per share
    pub price: f64,
    pub total: f64,
    pub balance_after: f64,
    /// Weighted-average entry price after the trade (buys only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_price: Option<f64>,
    /// Realized profit or loss against the average entry (sells only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realized_pnl: Option<f64>,
}

// =============================================================================
// Portfolio
// =============================================================================

/// An unsettled stake in the current market round, shown in the portfolio.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInvestment {
    pub class: MarketClass,
    pub symbol: String,
    pub amount: f64,
}

/// Everything a user owns: cash, priced holdings, and pending round stakes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    pub user_id: String,
    pub username: String,
    pub cash_balance: f64,
    pub holdings: Vec<PricedHolding>,
    pub holdings_value: f64,
    /// Cash plus holdings value; pending stakes are already out of cash
    pub total_value: f64,
    pub pending_investments: Vec<PendingInvestment>,
}

/// Compact balance summary for the funds check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundsView {
    pub cash_balance: f64,
    pub holdings_value: f64,
    pub total_value: f64,
}
