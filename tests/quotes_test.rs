//! Integration tests for the quote pipeline.

use moonbag::services::{QuoteService, SqliteStore, PRICE_CACHE_TTL_MS};
use moonbag::types::{Quote, QuoteOrigin};
use std::sync::Arc;
use std::time::Duration;

fn service(store: &Arc<SqliteStore>) -> QuoteService {
    QuoteService::new(store.clone(), None, Duration::from_secs(1))
}

#[tokio::test]
async fn test_unknown_symbol_gets_synthetic_quote() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let quotes = service(&store);

    let quote = quotes.get_quote("ZZZ").await;
    assert_eq!(quote.symbol, "ZZZ");
    assert_eq!(quote.origin, QuoteOrigin::Synthetic);
    assert!(quote.price >= 50.0 && quote.price < 250.0);
    assert!(quote.change_percent >= -5.0 && quote.change_percent < 5.0);
}

#[tokio::test]
async fn test_known_symbol_stays_in_band() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let quotes = service(&store);

    // AAPL has a demo base of 175.50 with a 2% band.
    let quote = quotes.get_quote("AAPL").await;
    assert!(quote.price >= 175.50 * 0.98 && quote.price <= 175.50 * 1.02);
    assert!(quote.change_percent.abs() <= 2.0);
}

#[tokio::test]
async fn test_cache_hit_within_ttl() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let quotes = service(&store);

    let first = quotes.get_quote("ZZZ").await;
    let second = quotes.get_quote("ZZZ").await;
    assert_eq!(second.origin, QuoteOrigin::Cached);
    assert_eq!(second.price, first.price);
    assert_eq!(second.change_percent, first.change_percent);
}

#[tokio::test]
async fn test_cache_is_shared_through_the_store() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let first_service = service(&store);
    let second_service = service(&store);

    let first = first_service.get_quote("ZZZ").await;
    let second = second_service.get_quote("ZZZ").await;

    // The cache lives in the database, not in the service.
    assert_eq!(second.origin, QuoteOrigin::Cached);
    assert_eq!(second.price, first.price);
}

#[tokio::test]
async fn test_symbols_are_uppercased() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let quotes = service(&store);

    let quote = quotes.get_quote("aapl").await;
    assert_eq!(quote.symbol, "AAPL");

    // Both spellings hit the same cache row.
    let again = quotes.get_quote("AAPL").await;
    assert_eq!(again.origin, QuoteOrigin::Cached);
    assert_eq!(again.price, quote.price);
}

#[test]
fn test_default_ttl_is_five_minutes() {
    assert_eq!(PRICE_CACHE_TTL_MS, 5 * 60 * 1000);
}

#[test]
fn test_stale_cache_entries_are_ignored() {
    let store = SqliteStore::new_in_memory().unwrap();
    let quote = Quote::new("ZZZ".to_string(), 123.45, 1.5, QuoteOrigin::Synthetic);
    store.cache_quote(&quote).unwrap();

    std::thread::sleep(Duration::from_millis(10));

    // Entry is older than a 1ms budget but well within the real TTL.
    assert!(store.cached_quote("ZZZ", 1).unwrap().is_none());
    let hit = store.cached_quote("ZZZ", PRICE_CACHE_TTL_MS).unwrap().unwrap();
    assert_eq!(hit.price, 123.45);
    assert_eq!(hit.origin, QuoteOrigin::Cached);
}
