//! Quote Types

use serde::{Deserialize, Serialize};

/// Where a quote's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOrigin {
    /// Fresh from the live provider
    Live,
    /// Served from the price cache
    Cached,
    /// Generated locally when no live quote was available
    Synthetic,
}

impl std::fmt::Display for QuoteOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteOrigin::Live => write!(f, "live"),
            QuoteOrigin::Cached => write!(f, "cached"),
            QuoteOrigin::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// A price quote for one symbol. The quote pipeline always produces one of
/// these; there is no error path visible to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    /// Absolute change on the day
    pub change: f64,
    /// Percent change on the day
    pub change_percent: f64,
    pub origin: QuoteOrigin,
}

impl Quote {
    pub fn new(symbol: String, price: f64, change_percent: f64, origin: QuoteOrigin) -> Self {
        let change = price * change_percent / 100.0;
        Self {
            symbol,
            price,
            change,
            change_percent,
            origin,
        }
    }
}
