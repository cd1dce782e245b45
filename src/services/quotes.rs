//! Quote lookup with a store-backed price cache
//!
//! Prices come from Alpha Vantage when an API key is configured, falling
//! back to synthetic quotes when the provider is missing, rate limited, or
//! down. Every resolved quote lands in the SQLite price cache so repeat
//! lookups inside the TTL never leave the process. Lookups cannot fail;
//! callers always get a price and the origin tells them how real it is.

use crate::services::SqliteStore;
use crate::sources::alphavantage::AlphaVantageClient;
use crate::sources::synthetic;
use crate::types::quote::{Quote, QuoteOrigin};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How long a cached price stays fresh.
pub const PRICE_CACHE_TTL_MS: i64 = 5 * 60 * 1000;

/// Resolves symbol prices: cache first, then the live provider, then the
/// synthetic generator.
pub struct QuoteService {
    store: Arc<SqliteStore>,
    client: Option<AlphaVantageClient>,
}

impl QuoteService {
    /// Build the service. A missing or blank API key disables the live
    /// provider entirely and every miss goes straight to synthetic.
    pub fn new(store: Arc<SqliteStore>, api_key: Option<String>, timeout: Duration) -> Self {
        let client = api_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| AlphaVantageClient::new(key, timeout));
        if client.is_none() {
            debug!("No Alpha Vantage API key configured, quotes will be synthetic");
        }
        Self { store, client }
    }

    /// Get a quote for a symbol. Symbols are case-insensitive.
    pub async fn get_quote(&self, symbol: &str) -> Quote {
        let symbol = symbol.to_uppercase();

        match self.store.cached_quote(&symbol, PRICE_CACHE_TTL_MS) {
            Ok(Some(quote)) => {
                debug!("Price cache hit for {}", symbol);
                return quote;
            }
            Ok(None) => {}
            Err(e) => warn!("Price cache read failed for {}: {}", symbol, e),
        }

        if let Some(client) = &self.client {
            match client.get_quote(&symbol).await {
                Ok(raw) => {
                    let price: f64 = raw.price.parse().unwrap_or(0.0);
                    if price > 0.0 {
                        let change_percent =
                            AlphaVantageClient::parse_change_percent(&raw.change_percent);
                        let mut quote =
                            Quote::new(symbol.clone(), price, change_percent, QuoteOrigin::Live);
                        // The provider reports the absolute change too; prefer
                        // its figure over our derived one when it parses.
                        if let Ok(change) = raw.change.parse() {
                            quote.change = change;
                        }
                        debug!("Live quote for {} at {:.2}", symbol, quote.price);
                        self.store_quote(&quote);
                        return quote;
                    }
                    warn!("Unparseable price from provider for {}: {:?}", symbol, raw.price);
                }
                Err(e) => warn!("Live quote lookup failed for {}: {}", symbol, e),
            }
        }

        let mut rng = rand::thread_rng();
        let quote = synthetic::demo_quote(&symbol, &mut rng);
        debug!("Synthetic quote for {} at {:.2}", symbol, quote.price);
        self.store_quote(&quote);
        quote
    }

    fn store_quote(&self, quote: &Quote) {
        if let Err(e) = self.store.cache_quote(quote) {
            warn!("Price cache write failed for {}: {}", quote.symbol, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> QuoteService {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        QuoteService::new(store, None, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_no_provider_falls_back_to_synthetic() {
        let svc = service();
        let quote = svc.get_quote("ZZZ").await;
        assert_eq!(quote.symbol, "ZZZ");
        assert_eq!(quote.origin, QuoteOrigin::Synthetic);
        assert!(quote.price >= 50.0 && quote.price < 250.0);
        assert!(quote.change_percent >= -5.0 && quote.change_percent < 5.0);
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let svc = service();
        let first = svc.get_quote("AAPL").await;
        let second = svc.get_quote("AAPL").await;
        assert_eq!(second.origin, QuoteOrigin::Cached);
        assert_eq!(second.price, first.price);
        assert_eq!(second.change_percent, first.change_percent);
    }

    #[tokio::test]
    async fn test_symbol_is_uppercased() {
        let svc = service();
        let quote = svc.get_quote("tsla").await;
        assert_eq!(quote.symbol, "TSLA");

        // The cache entry is keyed on the normalized symbol.
        let again = svc.get_quote("TSLA").await;
        assert_eq!(again.origin, QuoteOrigin::Cached);
    }

    #[tokio::test]
    async fn test_blank_api_key_disables_provider() {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        let svc = QuoteService::new(store, Some("   ".to_string()), Duration::from_secs(5));
        let quote = svc.get_quote("MSFT").await;
        assert_eq!(quote.origin, QuoteOrigin::Synthetic);
    }
}
