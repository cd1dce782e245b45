pub mod market;
pub mod names;
pub mod outcomes;
pub mod quotes;
pub mod sqlite_store;
pub mod trading;

pub use market::{MarketError, MarketService};
pub use quotes::{QuoteService, PRICE_CACHE_TTL_MS};
pub use sqlite_store::SqliteStore;
pub use trading::{TradingError, TradingService};
