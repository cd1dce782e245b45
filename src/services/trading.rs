//! Stock Trading Service
//!
//! Cash-account paper trading at quoted prices: market buys and sells with
//! weighted-average cost tracking, portfolios priced at current quotes, the
//! trade log, and the rankings board. Money movement happens inside the
//! store's transactions; this layer validates input, resolves prices, and
//! shapes the results.

use crate::services::quotes::QuoteService;
use crate::services::sqlite_store::{BuyOutcome, SellOutcome, SqliteStore};
use crate::types::trading::{
    FundsView, PendingInvestment, PortfolioView, PricedHolding, TradeAction, TradeReceipt,
    TransactionRecord,
};
use crate::types::user::{RankingEntry, User};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Most rows one history call may return.
const MAX_HISTORY_ROWS: i64 = 100;

/// Trading service errors.
#[derive(Debug, Error)]
pub enum TradingError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(f64),

    #[error("Insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("Not enough {symbol} shares: tried to sell {requested}, hold {held}")]
    InsufficientShares {
        symbol: String,
        requested: f64,
        held: f64,
    },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for TradingError {
    fn from(e: rusqlite::Error) -> Self {
        TradingError::DatabaseError(e.to_string())
    }
}

/// Executes trades and assembles portfolio and ranking views.
pub struct TradingService {
    store: Arc<SqliteStore>,
    quotes: Arc<QuoteService>,
    starting_balance: f64,
}

impl TradingService {
    pub fn new(store: Arc<SqliteStore>, quotes: Arc<QuoteService>, starting_balance: f64) -> Self {
        Self {
            store,
            quotes,
            starting_balance,
        }
    }

    /// Fetch-or-create the user row.
    pub fn ensure_user(&self, user_id: &str, username: &str) -> Result<User, TradingError> {
        Ok(self
            .store
            .ensure_user(user_id, username, self.starting_balance)?)
    }

    /// Market-buy shares at the current quote.
    pub async fn buy(
        &self,
        user_id: &str,
        username: &str,
        symbol: &str,
        quantity: f64,
    ) -> Result<TradeReceipt, TradingError> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(TradingError::InvalidQuantity(quantity));
        }
        self.ensure_user(user_id, username)?;
        let symbol = symbol.to_uppercase();
        let quote = self.quotes.get_quote(&symbol).await;

        match self
            .store
            .buy_stock(user_id, &symbol, quantity, quote.price)?
        {
            BuyOutcome::Executed(exec) => {
                info!(
                    "{} bought {} {} at {:.2}",
                    username, quantity, symbol, exec.price
                );
                Ok(TradeReceipt {
                    action: TradeAction::Buy,
                    symbol,
                    quantity,
                    price: exec.price,
                    total: exec.total,
                    balance_after: exec.balance_after,
                    avg_price: Some(exec.avg_price_after),
                    realized_pnl: None,
                })
            }
            BuyOutcome::ShortFunds { needed, available } => {
                Err(TradingError::InsufficientFunds { needed, available })
            }
        }
    }

    /// Market-sell shares at the current quote. Profit or loss is realized
    /// against the weighted-average entry price.
    pub async fn sell(
        &self,
        user_id: &str,
        username: &str,
        symbol: &str,
        quantity: f64,
    ) -> Result<TradeReceipt, TradingError> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(TradingError::InvalidQuantity(quantity));
        }
        self.ensure_user(user_id, username)?;
        let symbol = symbol.to_uppercase();
        let quote = self.quotes.get_quote(&symbol).await;

        match self
            .store
            .sell_stock(user_id, &symbol, quantity, quote.price)?
        {
            SellOutcome::Executed(exec) => {
                info!(
                    "{} sold {} {} at {:.2}",
                    username, quantity, symbol, exec.price
                );
                Ok(TradeReceipt {
                    action: TradeAction::Sell,
                    symbol,
                    quantity,
                    price: exec.price,
                    total: exec.total,
                    balance_after: exec.balance_after,
                    avg_price: None,
                    realized_pnl: exec.realized_pnl,
                })
            }
            SellOutcome::ShortShares { requested, held } => {
                Err(TradingError::InsufficientShares {
                    symbol,
                    requested,
                    held,
                })
            }
        }
    }

    /// Everything a user owns, with holdings priced at current quotes and
    /// any unsettled stakes in the open round listed alongside.
    pub async fn portfolio(
        &self,
        user_id: &str,
        username: &str,
    ) -> Result<PortfolioView, TradingError> {
        let user = self.ensure_user(user_id, username)?;
        let holdings = self.store.user_holdings(user_id)?;

        let mut priced = Vec::with_capacity(holdings.len());
        let mut holdings_value = 0.0;
        for holding in &holdings {
            let quote = self.quotes.get_quote(&holding.symbol).await;
            let market_value = holding.quantity * quote.price;
            let cost = holding.cost_basis();
            let unrealized_pnl = market_value - cost;
            let unrealized_pnl_pct = if cost > 0.0 {
                unrealized_pnl / cost * 100.0
            } else {
                0.0
            };
            holdings_value += market_value;
            priced.push(PricedHolding {
                symbol: holding.symbol.clone(),
                quantity: holding.quantity,
                avg_price: holding.avg_price,
                current_price: quote.price,
                market_value,
                unrealized_pnl,
                unrealized_pnl_pct,
            });
        }

        let pending_investments = match self.store.current_round()? {
            Some(round) => self
                .store
                .user_investments(user_id, round.id)?
                .into_iter()
                .map(|inv| PendingInvestment {
                    class: inv.class,
                    symbol: inv.symbol,
                    amount: inv.amount,
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(PortfolioView {
            user_id: user.id,
            username: user.username,
            cash_balance: user.balance,
            holdings: priced,
            holdings_value,
            total_value: user.balance + holdings_value,
            pending_investments,
        })
    }

    /// Cash, holdings value, and their sum.
    pub async fn funds(&self, user_id: &str, username: &str) -> Result<FundsView, TradingError> {
        let user = self.ensure_user(user_id, username)?;
        let holdings = self.store.user_holdings(user_id)?;

        let mut holdings_value = 0.0;
        for holding in &holdings {
            let quote = self.quotes.get_quote(&holding.symbol).await;
            holdings_value += holding.quantity * quote.price;
        }

        Ok(FundsView {
            cash_balance: user.balance,
            holdings_value,
            total_value: user.balance + holdings_value,
        })
    }

    /// The rankings board: every user by total value, cash plus holdings
    /// at current prices.
    pub async fn rankings(&self, limit: usize) -> Result<Vec<RankingEntry>, TradingError> {
        let users = self.store.get_all_users()?;
        let holdings = self.store.all_holdings()?;

        // Price each distinct held symbol once.
        let mut prices: Vec<(String, f64)> = Vec::new();
        for holding in &holdings {
            if !prices.iter().any(|(symbol, _)| *symbol == holding.symbol) {
                let quote = self.quotes.get_quote(&holding.symbol).await;
                prices.push((holding.symbol.clone(), quote.price));
            }
        }

        let mut entries: Vec<RankingEntry> = users
            .into_iter()
            .map(|user| {
                let holdings_value: f64 = holdings
                    .iter()
                    .filter(|h| h.user_id == user.id)
                    .map(|h| {
                        let price = prices
                            .iter()
                            .find(|(symbol, _)| *symbol == h.symbol)
                            .map(|(_, price)| *price)
                            .unwrap_or(h.avg_price);
                        h.quantity * price
                    })
                    .sum();
                RankingEntry {
                    rank: 0,
                    user_id: user.id,
                    username: user.username,
                    cash_balance: user.balance,
                    holdings_value,
                    total_value: user.balance + holdings_value,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.total_value
                .partial_cmp(&a.total_value)
                .unwrap_or(Ordering::Equal)
        });
        entries.truncate(limit);
        for (idx, entry) in entries.iter_mut().enumerate() {
            entry.rank = idx + 1;
        }
        Ok(entries)
    }

    /// A user's most recent trades, newest first. The limit is clamped to
    /// 1..=100 before it reaches the store; SQLite reads a negative LIMIT
    /// as unbounded.
    pub fn history(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>, TradingError> {
        let limit = limit.clamp(1, MAX_HISTORY_ROWS);
        Ok(self.store.recent_transactions(user_id, limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::market::{MarketClass, NewMarketOption, Outcome};
    use std::time::Duration;

    fn service() -> (Arc<SqliteStore>, TradingService) {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        let quotes = Arc::new(QuoteService::new(
            store.clone(),
            None,
            Duration::from_secs(5),
        ));
        (store.clone(), TradingService::new(store, quotes, 1000.0))
    }

    #[tokio::test]
    async fn test_buy_debits_cash_and_opens_position() {
        let (_, svc) = service();
        // Prime the cache so the trade executes at a known price.
        let price = svc.quotes.get_quote("AAPL").await.price;

        let receipt = svc.buy("u1", "alice", "AAPL", 2.0).await.unwrap();
        assert_eq!(receipt.action, TradeAction::Buy);
        assert_eq!(receipt.price, price);
        assert!((receipt.total - price * 2.0).abs() < 1e-9);
        assert!((receipt.balance_after - (1000.0 - receipt.total)).abs() < 1e-9);
        assert_eq!(receipt.avg_price, Some(price));
        assert_eq!(receipt.realized_pnl, None);
    }

    #[tokio::test]
    async fn test_buy_rejects_bad_quantities() {
        let (_, svc) = service();
        for quantity in [0.0, -1.0, f64::NAN] {
            let err = svc.buy("u1", "alice", "AAPL", quantity).await.unwrap_err();
            assert!(matches!(err, TradingError::InvalidQuantity(_)));
        }
    }

    #[tokio::test]
    async fn test_buy_insufficient_funds() {
        let (_, svc) = service();
        // 100 shares of AAPL costs far more than the starting balance.
        let err = svc.buy("u1", "alice", "AAPL", 100.0).await.unwrap_err();
        assert!(matches!(err, TradingError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn test_sell_at_entry_price_realizes_zero() {
        let (_, svc) = service();
        svc.buy("u1", "alice", "AAPL", 2.0).await.unwrap();

        // The cached quote still covers the sell, so entry == exit.
        let receipt = svc.sell("u1", "alice", "AAPL", 1.0).await.unwrap();
        assert_eq!(receipt.action, TradeAction::Sell);
        assert_eq!(receipt.avg_price, None);
        let pnl = receipt.realized_pnl.unwrap();
        assert!(pnl.abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_sell_more_than_held() {
        let (_, svc) = service();
        svc.buy("u1", "alice", "AAPL", 2.0).await.unwrap();

        let err = svc.sell("u1", "alice", "AAPL", 5.0).await.unwrap_err();
        match err {
            TradingError::InsufficientShares {
                symbol,
                requested,
                held,
            } => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(requested, 5.0);
                assert_eq!(held, 2.0);
            }
            other => panic!("expected InsufficientShares, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_symbols_are_case_insensitive() {
        let (_, svc) = service();
        svc.buy("u1", "alice", "aapl", 1.0).await.unwrap();
        let receipt = svc.sell("u1", "alice", "Aapl", 1.0).await.unwrap();
        assert_eq!(receipt.symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_portfolio_prices_holdings_at_quotes() {
        let (_, svc) = service();
        svc.buy("u1", "alice", "AAPL", 2.0).await.unwrap();

        let view = svc.portfolio("u1", "alice").await.unwrap();
        assert_eq!(view.username, "alice");
        assert_eq!(view.holdings.len(), 1);

        let holding = &view.holdings[0];
        assert_eq!(holding.symbol, "AAPL");
        assert_eq!(holding.quantity, 2.0);
        // Bought and priced at the same cached quote.
        assert_eq!(holding.current_price, holding.avg_price);
        assert!(holding.unrealized_pnl.abs() < 1e-9);
        // No value appears or vanishes when the price has not moved.
        assert!((view.total_value - 1000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_portfolio_lists_pending_stakes() {
        let (store, svc) = service();
        svc.ensure_user("u1", "alice").unwrap();
        store
            .create_round(
                1,
                "normal",
                &[NewMarketOption {
                    class: MarketClass::Crypto,
                    symbol: "DOGROC".to_string(),
                    name: "DogeRocket".to_string(),
                    multiplier: 5.0,
                    outcome: Outcome::Moon,
                }],
            )
            .unwrap();
        store
            .stake("u1", MarketClass::Crypto, "DOGROC", 100.0)
            .unwrap();

        let view = svc.portfolio("u1", "alice").await.unwrap();
        assert_eq!(view.cash_balance, 900.0);
        assert_eq!(view.pending_investments.len(), 1);
        assert_eq!(view.pending_investments[0].symbol, "DOGROC");
        assert_eq!(view.pending_investments[0].amount, 100.0);
        // Pending stakes are already out of cash, not counted again.
        assert!((view.total_value - 900.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_funds_sums_cash_and_holdings() {
        let (_, svc) = service();
        svc.buy("u1", "alice", "TSLA", 1.0).await.unwrap();

        let funds = svc.funds("u1", "alice").await.unwrap();
        assert!(funds.holdings_value > 0.0);
        assert!((funds.total_value - (funds.cash_balance + funds.holdings_value)).abs() < 1e-9);
        assert!((funds.total_value - 1000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rankings_order_and_limit() {
        let (store, svc) = service();
        svc.ensure_user("u1", "alice").unwrap();
        svc.ensure_user("u2", "bob").unwrap();
        store
            .create_round(
                1,
                "normal",
                &[NewMarketOption {
                    class: MarketClass::Crypto,
                    symbol: "DOGROC".to_string(),
                    name: "DogeRocket".to_string(),
                    multiplier: 0.0,
                    outcome: Outcome::Rug,
                }],
            )
            .unwrap();
        // A pending stake drops alice's total below bob's untouched 1000.
        store
            .stake("u1", MarketClass::Crypto, "DOGROC", 100.0)
            .unwrap();

        let rankings = svc.rankings(10).await.unwrap();
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].username, "bob");
        assert_eq!(rankings[0].rank, 1);
        assert_eq!(rankings[0].total_value, 1000.0);
        assert_eq!(rankings[1].username, "alice");
        assert_eq!(rankings[1].rank, 2);
        assert_eq!(rankings[1].total_value, 900.0);

        let top = svc.rankings(1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].username, "bob");
    }

    #[tokio::test]
    async fn test_rankings_include_holdings_value() {
        let (_, svc) = service();
        svc.buy("u1", "alice", "MSFT", 1.0).await.unwrap();

        let rankings = svc.rankings(10).await.unwrap();
        let entry = &rankings[0];
        assert!(entry.holdings_value > 0.0);
        assert!(
            (entry.total_value - (entry.cash_balance + entry.holdings_value)).abs() < 1e-9
        );
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let (_, svc) = service();
        svc.buy("u1", "alice", "AAPL", 2.0).await.unwrap();
        svc.buy("u1", "alice", "TSLA", 1.0).await.unwrap();
        svc.sell("u1", "alice", "AAPL", 1.0).await.unwrap();

        let history = svc.history("u1", 10).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].action, TradeAction::Sell);
        assert_eq!(history[0].symbol, "AAPL");
        assert_eq!(history[1].symbol, "TSLA");
        assert_eq!(history[2].symbol, "AAPL");

        let recent = svc.history("u1", 2).unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn test_history_clamps_hostile_limits() {
        let (_, svc) = service();
        svc.buy("u1", "alice", "AAPL", 2.0).await.unwrap();
        svc.buy("u1", "alice", "TSLA", 1.0).await.unwrap();
        svc.sell("u1", "alice", "AAPL", 1.0).await.unwrap();

        // A negative limit must not dump the full log.
        let one = svc.history("u1", -1).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].action, TradeAction::Sell);

        assert_eq!(svc.history("u1", 0).unwrap().len(), 1);
        assert_eq!(svc.history("u1", i64::MAX).unwrap().len(), 3);
    }
}
