//! User Types
//!
//! Player accounts and rankings. Identity comes from the chat platform; a
//! user row is created on first interaction with the starting balance.

use serde::{Deserialize, Serialize};

/// A player account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Chat platform user id (opaque string)
    pub id: String,
    /// Display name, refreshed on every interaction
    pub username: String,
    /// Cash balance; never negative
    pub balance: f64,
    /// Unix timestamp when the account was first seen
    pub created_at: i64,
}

/// One row of the rankings board: cash plus the market value of holdings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub cash_balance: f64,
    pub holdings_value: f64,
    pub total_value: f64,
}
