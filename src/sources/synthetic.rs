//! Synthetic quote generation
//!
//! Demo prices for when the live provider is rate limited, erroring, or not
//! configured. Known symbols wobble around a fixed base price within their
//! volatility band; unknown symbols get a plausible random price. This is
//! the bottom of the quote pipeline and cannot fail.

use rand::Rng;

use crate::types::quote::{Quote, QuoteOrigin};

/// Base price and volatility band per known symbol.
const DEMO_PRICES: &[(&str, f64, f64)] = &[
    // Tech stocks
    ("AAPL", 175.50, 0.02),
    ("MSFT", 338.25, 0.015),
    ("GOOGL", 125.80, 0.025),
    ("AMZN", 128.40, 0.03),
    ("TSLA", 242.15, 0.04),
    ("META", 298.75, 0.035),
    ("NVDA", 422.30, 0.045),
    ("NFLX", 385.60, 0.03),
    // Finance stocks
    ("JPM", 152.25, 0.02),
    ("BAC", 34.80, 0.025),
    ("WFC", 42.15, 0.03),
    ("GS", 358.90, 0.025),
    ("MS", 85.45, 0.03),
    ("V", 258.75, 0.015),
    ("MA", 398.20, 0.02),
    ("AXP", 175.60, 0.025),
    // Other popular stocks
    ("JNJ", 162.30, 0.015),
    ("WMT", 158.90, 0.015),
    ("PG", 155.75, 0.015),
    ("KO", 62.85, 0.015),
    ("PEP", 172.40, 0.015),
    ("DIS", 94.25, 0.03),
];

fn base_for(symbol: &str) -> Option<(f64, f64)> {
    DEMO_PRICES
        .iter()
        .find(|(s, _, _)| *s == symbol)
        .map(|(_, base, vol)| (*base, *vol))
}

/// Generate a synthetic quote for a symbol.
///
/// Known symbols: price = base * (1 + v) with v uniform in +/- volatility,
/// change percent = v * 100. Unknown symbols: price uniform in [50, 250),
/// change percent uniform in [-5, 5).
pub fn demo_quote(symbol: &str, rng: &mut impl Rng) -> Quote {
    match base_for(symbol) {
        Some((base, volatility)) => {
            let variation = (rng.gen::<f64>() - 0.5) * 2.0 * volatility;
            let price = base * (1.0 + variation);
            let change_percent = variation * 100.0;
            Quote::new(symbol.to_string(), price, change_percent, QuoteOrigin::Synthetic)
        }
        None => {
            let price = rng.gen::<f64>() * 200.0 + 50.0;
            let change_percent = (rng.gen::<f64>() - 0.5) * 10.0;
            Quote::new(symbol.to_string(), price, change_percent, QuoteOrigin::Synthetic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_symbol_stays_in_band() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let quote = demo_quote("AAPL", &mut rng);
            // Base 175.50, volatility 2%: price within [171.99, 179.01]
            assert!(quote.price >= 175.50 * 0.98 && quote.price <= 175.50 * 1.02);
            assert!(quote.change_percent.abs() <= 2.0);
            assert_eq!(quote.origin, QuoteOrigin::Synthetic);
        }
    }

    #[test]
    fn test_unknown_symbol_in_fallback_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let quote = demo_quote("ZZZ", &mut rng);
            assert!(quote.price >= 50.0 && quote.price < 250.0);
            assert!(quote.change_percent >= -5.0 && quote.change_percent < 5.0);
        }
    }

    #[test]
    fn test_change_consistent_with_percent() {
        let mut rng = rand::thread_rng();
        let quote = demo_quote("MSFT", &mut rng);
        let expected = quote.price * quote.change_percent / 100.0;
        assert!((quote.change - expected).abs() < 1e-9);
    }
}
