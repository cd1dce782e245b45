//! Outcome Generator
//!
//! Maps a uniform draw in [0,1) to the pre-determined outcome of a market
//! option. Each class has a cumulative table whose entries are exclusive
//! upper bounds; the intervals partition [0,1) with no gaps or overlaps.

use rand::Rng;

use crate::types::market::{MarketClass, Outcome};

/// Crypto distribution: 20% rug, 30% dip, 30% sideways, 15% bull, 5% moon.
const CRYPTO_TABLE: [(f64, Outcome); 5] = [
    (0.20, Outcome::Rug),
    (0.50, Outcome::Dip),
    (0.80, Outcome::Sideways),
    (0.95, Outcome::Bull),
    (1.0, Outcome::Moon),
];

/// Business distribution: 5% bankruptcy, 20% bad quarter, 40% break even,
/// 25% profitable, 10% huge success.
const BUSINESS_TABLE: [(f64, Outcome); 5] = [
    (0.05, Outcome::Bankruptcy),
    (0.25, Outcome::BadQuarter),
    (0.65, Outcome::BreakEven),
    (0.90, Outcome::Profitable),
    (1.0, Outcome::HugeSuccess),
];

fn table_for(class: MarketClass) -> &'static [(f64, Outcome); 5] {
    match class {
        MarketClass::Crypto => &CRYPTO_TABLE,
        MarketClass::Business => &BUSINESS_TABLE,
    }
}

/// Map a roll in [0,1) to an outcome. The first interval whose upper bound
/// exceeds the roll wins, so boundary values land in the higher interval.
pub fn generate(class: MarketClass, roll: f64) -> Outcome {
    let table = table_for(class);
    for (bound, outcome) in table {
        if roll < *bound {
            return *outcome;
        }
    }
    // Unreachable for roll in [0,1); clamp out-of-range input to the top.
    table[table.len() - 1].1
}

/// Draw a fresh outcome for the given class.
pub fn draw(class: MarketClass, rng: &mut impl Rng) -> Outcome {
    generate(class, rng.gen::<f64>())
}
