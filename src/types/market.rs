//! Market Round Types
//!
//! Types for the randomized investment game: rounds, the per-round option
//! catalog, investments, and settlement reports.

use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Instrument class for a market option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketClass {
    /// Synthetic memecoins, generated fresh each round
    Crypto,
    /// Business stocks sampled from a fixed universe
    Business,
}

impl MarketClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketClass::Crypto => "crypto",
            MarketClass::Business => "business",
        }
    }
}

impl std::fmt::Display for MarketClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MarketClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crypto" => Ok(MarketClass::Crypto),
            "business" => Ok(MarketClass::Business),
            other => Err(format!("unknown market class: {}", other)),
        }
    }
}

/// Outcome label for a market option, fixed at catalog creation and revealed
/// at settlement. Each label binds to exactly one payout multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    // Crypto outcomes
    Rug,
    Dip,
    Sideways,
    Bull,
    Moon,
    // Business outcomes
    Bankruptcy,
    BadQuarter,
    BreakEven,
    Profitable,
    HugeSuccess,
}

impl Outcome {
    /// The payout multiplier this outcome settles at.
    pub fn multiplier(&self) -> f64 {
        match self {
            Outcome::Rug => 0.0,
            Outcome::Dip => 0.5,
            Outcome::Sideways => 1.0,
            Outcome::Bull => 2.0,
            Outcome::Moon => 5.0,
            Outcome::Bankruptcy => 0.0,
            Outcome::BadQuarter => 0.5,
            Outcome::BreakEven => 1.0,
            Outcome::Profitable => 1.5,
            Outcome::HugeSuccess => 3.0,
        }
    }

    /// Which instrument class this outcome belongs to.
    pub fn class(&self) -> MarketClass {
        match self {
            Outcome::Rug
            | Outcome::Dip
            | Outcome::Sideways
            | Outcome::Bull
            | Outcome::Moon => MarketClass::Crypto,
            Outcome::Bankruptcy
            | Outcome::BadQuarter
            | Outcome::BreakEven
            | Outcome::Profitable
            | Outcome::HugeSuccess => MarketClass::Business,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Rug => "rug",
            Outcome::Dip => "dip",
            Outcome::Sideways => "sideways",
            Outcome::Bull => "bull",
            Outcome::Moon => "moon",
            Outcome::Bankruptcy => "bankruptcy",
            Outcome::BadQuarter => "bad_quarter",
            Outcome::BreakEven => "break_even",
            Outcome::Profitable => "profitable",
            Outcome::HugeSuccess => "huge_success",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rug" => Ok(Outcome::Rug),
            "dip" => Ok(Outcome::Dip),
            "sideways" => Ok(Outcome::Sideways),
            "bull" => Ok(Outcome::Bull),
            "moon" => Ok(Outcome::Moon),
            "bankruptcy" => Ok(Outcome::Bankruptcy),
            "bad_quarter" => Ok(Outcome::BadQuarter),
            "break_even" => Ok(Outcome::BreakEven),
            "profitable" => Ok(Outcome::Profitable),
            "huge_success" => Ok(Outcome::HugeSuccess),
            other => Err(format!("unknown outcome: {}", other)),
        }
    }
}

// =============================================================================
// Rounds & Options
// =============================================================================

/// A market round. The round with the highest number is the open one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Row id
    pub id: i64,
    /// Sequential round number, starting at 1
    pub round_number: i64,
    /// Display-only mood tag chosen at creation
    pub mood: String,
    /// Unix timestamp when the round opened
    pub created_at: i64,
}

/// A tradeable option within one round, with its pre-drawn outcome.
/// Never exposed to clients in this form; see [`MarketOptionView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOption {
    pub id: i64,
    pub round_id: i64,
    pub class: MarketClass,
    pub symbol: String,
    pub name: String,
    /// Payout multiplier, hidden until settlement
    pub multiplier: f64,
    /// Outcome label bound at creation time
    pub outcome: Outcome,
}

/// Insert shape for a catalog entry (ids assigned by the store).
#[derive(Debug, Clone)]
pub struct NewMarketOption {
    pub class: MarketClass,
    pub symbol: String,
    pub name: String,
    pub multiplier: f64,
    pub outcome: Outcome,
}

/// Public catalog entry: what players see before settlement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOptionView {
    pub class: MarketClass,
    pub symbol: String,
    pub name: String,
}

impl From<&MarketOption> for MarketOptionView {
    fn from(opt: &MarketOption) -> Self {
        Self {
            class: opt.class,
            symbol: opt.symbol.clone(),
            name: opt.name.clone(),
        }
    }
}

/// The current round's catalog as shown to players. Multipliers and outcome
/// labels stay hidden.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketView {
    pub round_number: i64,
    pub mood: String,
    pub crypto: Vec<MarketOptionView>,
    pub business: Vec<MarketOptionView>,
}

// =============================================================================
// Investments
// =============================================================================

/// A single stake by a user in one round's option.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: i64,
    pub user_id: String,
    pub round_id: i64,
    /// The option row this stake bound to when it was placed
    pub option_id: i64,
    pub class: MarketClass,
    pub symbol: String,
    /// Amount staked; debited from the balance when placed, never mutated
    pub amount: f64,
    pub settled: bool,
    pub created_at: i64,
}

// =============================================================================
// Settlement
// =============================================================================

/// One settled investment within a settlement report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementLine {
    pub class: MarketClass,
    pub symbol: String,
    pub name: String,
    pub amount: f64,
    pub multiplier: f64,
    pub outcome: Outcome,
    pub payout: f64,
}

/// All of one user's results for a settled round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettlement {
    pub user_id: String,
    pub username: String,
    pub total_staked: f64,
    pub total_payout: f64,
    /// Payout minus stake; negative on a losing round
    pub net: f64,
    pub lines: Vec<SettlementLine>,
}

/// Result of settling a round: per-user breakdowns plus the round that
/// opened to replace the settled one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub round_number: i64,
    pub next_round_number: i64,
    pub total_staked: f64,
    pub total_paid_out: f64,
    pub users: Vec<UserSettlement>,
}
