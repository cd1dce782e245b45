//! SQLite persistence layer for the whole game state.
//!
//! Everything lives in one database file:
//! - Users and their cash balances
//! - Market rounds with their option catalogs (multipliers drawn up front)
//! - Investments, settled and open
//! - Stock holdings and trade history
//! - The shared price cache
//!
//! A single connection behind a mutex keeps every multi-step money movement
//! (staking, settlement, buys, sells) inside one transaction.

use crate::types::{
    Holding, Investment, MarketClass, MarketOption, NewMarketOption, Outcome, Quote, QuoteOrigin,
    Round, TradeAction, TransactionRecord, User,
};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// SQLite store for users, rounds, investments, holdings, and quotes.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        // Users table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                balance REAL NOT NULL DEFAULT 1000.0,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Market rounds, one row per generated catalog
        conn.execute(
            "CREATE TABLE IF NOT EXISTS market_rounds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                round_number INTEGER NOT NULL UNIQUE,
                mood TEXT NOT NULL DEFAULT 'normal',
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Option catalog; multiplier and outcome are fixed at creation time
        conn.execute(
            "CREATE TABLE IF NOT EXISTS market_options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                round_id INTEGER NOT NULL REFERENCES market_rounds(id),
                class TEXT NOT NULL,
                symbol TEXT NOT NULL,
                name TEXT NOT NULL,
                multiplier REAL NOT NULL,
                outcome TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_options_round ON market_options(round_id)",
            [],
        )?;

        // Investments reference the exact option row they were placed on
        conn.execute(
            "CREATE TABLE IF NOT EXISTS investments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id),
                round_id INTEGER NOT NULL REFERENCES market_rounds(id),
                option_id INTEGER NOT NULL REFERENCES market_options(id),
                class TEXT NOT NULL,
                symbol TEXT NOT NULL,
                amount REAL NOT NULL,
                settled INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_investments_round ON investments(round_id, settled)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_investments_user ON investments(user_id)",
            [],
        )?;

        // Stock holdings, one row per user and symbol
        conn.execute(
            "CREATE TABLE IF NOT EXISTS holdings (
                user_id TEXT NOT NULL REFERENCES users(id),
                symbol TEXT NOT NULL,
                quantity REAL NOT NULL,
                avg_price REAL NOT NULL,
                PRIMARY KEY (user_id, symbol)
            )",
            [],
        )?;

        // Trade history
        conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id),
                symbol TEXT NOT NULL,
                action TEXT NOT NULL,
                quantity REAL NOT NULL,
                price REAL NOT NULL,
                total REAL NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id)",
            [],
        )?;

        // Price cache shared by every quote consumer
        conn.execute(
            "CREATE TABLE IF NOT EXISTS price_cache (
                symbol TEXT PRIMARY KEY,
                price REAL NOT NULL,
                change_percent REAL NOT NULL,
                fetched_at INTEGER NOT NULL
            )",
            [],
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    // ========== User Methods ==========

    /// Fetch a user, creating the row with the starting balance on first
    /// sight. An existing user gets their username refreshed so renames
    /// carry over.
    pub fn ensure_user(
        &self,
        user_id: &str,
        username: &str,
        starting_balance: f64,
    ) -> Result<User, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        let existing = conn.query_row(
            "SELECT id, username, balance, created_at FROM users WHERE id = ?1",
            params![user_id],
            user_from_row,
        );

        match existing {
            Ok(mut user) => {
                if user.username != username {
                    conn.execute(
                        "UPDATE users SET username = ?1 WHERE id = ?2",
                        params![username, user_id],
                    )?;
                    user.username = username.to_string();
                }
                Ok(user)
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                let now = chrono::Utc::now().timestamp();
                conn.execute(
                    "INSERT INTO users (id, username, balance, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![user_id, username, starting_balance, now],
                )?;
                info!(
                    "Created user {} ({}) with balance {}",
                    username, user_id, starting_balance
                );
                Ok(User {
                    id: user_id.to_string(),
                    username: username.to_string(),
                    balance: starting_balance,
                    created_at: now,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Get a user by id.
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, username, balance, created_at FROM users WHERE id = ?1",
            params![user_id],
            user_from_row,
        );

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All users, richest first by cash balance.
    pub fn get_all_users(&self) -> Result<Vec<User>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, username, balance, created_at FROM users ORDER BY balance DESC")?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect()
    }

    // ========== Market Round Methods ==========

    /// Latest round by round number, or None before the first round opens.
    /// Callers re-read this per request rather than holding on to it.
    pub fn current_round(&self) -> Result<Option<Round>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, round_number, mood, created_at FROM market_rounds
             ORDER BY round_number DESC LIMIT 1",
            [],
            round_from_row,
        );

        match result {
            Ok(round) => Ok(Some(round)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Open a round together with its full option catalog in one transaction.
    pub fn create_round(
        &self,
        round_number: i64,
        mood: &str,
        options: &[NewMarketOption],
    ) -> Result<Round, rusqlite::Error> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let round = insert_round(&tx, round_number, mood, options)?;
        tx.commit()?;

        info!(
            "Opened round {} with {} options (mood: {})",
            round.round_number,
            options.len(),
            round.mood
        );
        Ok(round)
    }

    /// Catalog of a round, business options first, symbols alphabetical.
    pub fn round_options(&self, round_id: i64) -> Result<Vec<MarketOption>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, round_id, class, symbol, name, multiplier, outcome
             FROM market_options WHERE round_id = ?1 ORDER BY class, symbol",
        )?;
        let rows = stmt.query_map(params![round_id], option_from_row)?;
        rows.collect()
    }

    // ========== Investment Methods ==========

    /// Place a stake on one option of the open round.
    ///
    /// The open round is resolved inside the transaction, together with the
    /// option lookup, balance check, debit, and investment insert, so a
    /// stake racing a settlement binds to whichever round is open when it
    /// commits, never to one that just closed, and two concurrent stakes
    /// cannot overdraw a balance. When several options share a symbol the
    /// stake binds to the lowest option id.
    pub fn stake(
        &self,
        user_id: &str,
        class: MarketClass,
        symbol: &str,
        amount: f64,
    ) -> Result<StakeOutcome, rusqlite::Error> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        // No round yet means nothing to stake on.
        let round_id: i64 = match tx.query_row(
            "SELECT id FROM market_rounds ORDER BY round_number DESC LIMIT 1",
            [],
            |row| row.get(0),
        ) {
            Ok(id) => id,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Ok(StakeOutcome::UnknownOption);
            }
            Err(e) => return Err(e),
        };

        let option_id: i64 = match tx.query_row(
            "SELECT id FROM market_options
             WHERE round_id = ?1 AND class = ?2 AND symbol = ?3
             ORDER BY id LIMIT 1",
            params![round_id, class.as_str(), symbol],
            |row| row.get(0),
        ) {
            Ok(id) => id,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Ok(StakeOutcome::UnknownOption);
            }
            Err(e) => return Err(e),
        };

        let balance: f64 = tx.query_row(
            "SELECT balance FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        if amount > balance {
            return Ok(StakeOutcome::ShortFunds {
                needed: amount,
                available: balance,
            });
        }

        let now = chrono::Utc::now().timestamp();
        tx.execute(
            "UPDATE users SET balance = balance - ?1 WHERE id = ?2",
            params![amount, user_id],
        )?;
        tx.execute(
            "INSERT INTO investments (user_id, round_id, option_id, class, symbol, amount, settled, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![user_id, round_id, option_id, class.as_str(), symbol, amount, now],
        )?;
        let investment = Investment {
            id: tx.last_insert_rowid(),
            user_id: user_id.to_string(),
            round_id,
            option_id,
            class,
            symbol: symbol.to_string(),
            amount,
            settled: false,
            created_at: now,
        };
        tx.commit()?;

        debug!("{} staked {} on {} {}", user_id, amount, class, symbol);
        Ok(StakeOutcome::Placed(investment))
    }

    /// Unsettled stakes one user holds in the given round.
    pub fn user_investments(
        &self,
        user_id: &str,
        round_id: i64,
    ) -> Result<Vec<Investment>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, round_id, option_id, class, symbol, amount, settled, created_at
             FROM investments
             WHERE user_id = ?1 AND round_id = ?2 AND settled = 0
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user_id, round_id], investment_from_row)?;
        rows.collect()
    }

    /// Settle every open stake in a round and open the next round, atomically.
    ///
    /// With nothing staked the call writes nothing at all: no payouts, no
    /// settled flags, and no new round. Payouts are applied as one additive
    /// credit per user, never one per stake.
    pub fn settle_round(
        &self,
        round_id: i64,
        next_round_number: i64,
        next_mood: &str,
        next_options: &[NewMarketOption],
    ) -> Result<SettleOutcome, rusqlite::Error> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let stakes = {
            let mut stmt = tx.prepare(
                "SELECT i.user_id, u.username, o.class, o.symbol, o.name, i.amount, o.multiplier, o.outcome
                 FROM investments i
                 JOIN users u ON u.id = i.user_id
                 JOIN market_options o ON o.id = i.option_id
                 WHERE i.round_id = ?1 AND i.settled = 0
                 ORDER BY i.id",
            )?;
            let rows = stmt.query_map(params![round_id], |row| {
                let amount: f64 = row.get(5)?;
                let multiplier: f64 = row.get(6)?;
                Ok(SettledStake {
                    user_id: row.get(0)?,
                    username: row.get(1)?,
                    class: parse_class(2, row.get(2)?)?,
                    symbol: row.get(3)?,
                    name: row.get(4)?,
                    amount,
                    multiplier,
                    outcome: parse_outcome(7, row.get(7)?)?,
                    payout: amount * multiplier,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        if stakes.is_empty() {
            return Ok(SettleOutcome::NothingStaked);
        }

        // One additive credit per user, preserving first-seen order.
        let mut credits: Vec<(String, f64)> = Vec::new();
        for stake in &stakes {
            match credits.iter().position(|(id, _)| *id == stake.user_id) {
                Some(idx) => credits[idx].1 += stake.payout,
                None => credits.push((stake.user_id.clone(), stake.payout)),
            }
        }
        for (user_id, total) in &credits {
            if *total > 0.0 {
                tx.execute(
                    "UPDATE users SET balance = balance + ?1 WHERE id = ?2",
                    params![total, user_id],
                )?;
            }
        }

        tx.execute(
            "UPDATE investments SET settled = 1 WHERE round_id = ?1 AND settled = 0",
            params![round_id],
        )?;

        let next_round = insert_round(&tx, next_round_number, next_mood, next_options)?;
        tx.commit()?;

        info!(
            "Settled round id {} ({} stakes across {} users), opened round {}",
            round_id,
            stakes.len(),
            credits.len(),
            next_round.round_number
        );
        Ok(SettleOutcome::Settled { stakes, next_round })
    }

    // ========== Holding Methods ==========

    /// One user's open stock positions.
    pub fn user_holdings(&self, user_id: &str) -> Result<Vec<Holding>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, symbol, quantity, avg_price FROM holdings
             WHERE user_id = ?1 AND quantity > 0 ORDER BY symbol",
        )?;
        let rows = stmt.query_map(params![user_id], holding_from_row)?;
        rows.collect()
    }

    /// Every open position across all users (for rankings).
    pub fn all_holdings(&self) -> Result<Vec<Holding>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, symbol, quantity, avg_price FROM holdings
             WHERE quantity > 0 ORDER BY user_id, symbol",
        )?;
        let rows = stmt.query_map([], holding_from_row)?;
        rows.collect()
    }

    /// Buy shares at the given price. The cost check, debit, weighted-average
    /// holding update, and transaction record share one transaction.
    pub fn buy_stock(
        &self,
        user_id: &str,
        symbol: &str,
        quantity: f64,
        price: f64,
    ) -> Result<BuyOutcome, rusqlite::Error> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let total = price * quantity;
        let balance: f64 = tx.query_row(
            "SELECT balance FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        if total > balance {
            return Ok(BuyOutcome::ShortFunds {
                needed: total,
                available: balance,
            });
        }

        let holding = match tx.query_row(
            "SELECT quantity, avg_price FROM holdings WHERE user_id = ?1 AND symbol = ?2",
            params![user_id, symbol],
            |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
        ) {
            Ok(h) => Some(h),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e),
        };
        let (quantity_after, avg_price_after) = match holding {
            Some((held, avg)) => {
                let new_quantity = held + quantity;
                let new_avg = (held * avg + total) / new_quantity;
                (new_quantity, new_avg)
            }
            None => (quantity, price),
        };

        tx.execute(
            "UPDATE users SET balance = balance - ?1 WHERE id = ?2",
            params![total, user_id],
        )?;
        tx.execute(
            "INSERT INTO holdings (user_id, symbol, quantity, avg_price) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, symbol) DO UPDATE SET quantity = ?3, avg_price = ?4",
            params![user_id, symbol, quantity_after, avg_price_after],
        )?;
        let now = chrono::Utc::now().timestamp();
        tx.execute(
            "INSERT INTO transactions (user_id, symbol, action, quantity, price, total, created_at)
             VALUES (?1, ?2, 'buy', ?3, ?4, ?5, ?6)",
            params![user_id, symbol, quantity, price, total, now],
        )?;
        tx.commit()?;

        debug!("{} bought {} {} at {}", user_id, quantity, symbol, price);
        Ok(BuyOutcome::Executed(TradeExecution {
            price,
            total,
            balance_after: balance - total,
            quantity_after,
            avg_price_after,
            realized_pnl: None,
        }))
    }

    /// Sell shares at the given price. The average cost stays as it was;
    /// realized profit is (price - avg) * quantity.
    pub fn sell_stock(
        &self,
        user_id: &str,
        symbol: &str,
        quantity: f64,
        price: f64,
    ) -> Result<SellOutcome, rusqlite::Error> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let balance: f64 = tx.query_row(
            "SELECT balance FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let holding = match tx.query_row(
            "SELECT quantity, avg_price FROM holdings WHERE user_id = ?1 AND symbol = ?2",
            params![user_id, symbol],
            |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
        ) {
            Ok(h) => Some(h),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e),
        };
        let (held, avg_price) = holding.unwrap_or((0.0, 0.0));
        if quantity > held {
            return Ok(SellOutcome::ShortShares {
                requested: quantity,
                held,
            });
        }

        let total = price * quantity;
        let quantity_after = held - quantity;

        tx.execute(
            "UPDATE users SET balance = balance + ?1 WHERE id = ?2",
            params![total, user_id],
        )?;
        // A position sold down to nothing is removed outright.
        if quantity_after > 1e-9 {
            tx.execute(
                "UPDATE holdings SET quantity = ?1 WHERE user_id = ?2 AND symbol = ?3",
                params![quantity_after, user_id, symbol],
            )?;
        } else {
            tx.execute(
                "DELETE FROM holdings WHERE user_id = ?1 AND symbol = ?2",
                params![user_id, symbol],
            )?;
        }
        let now = chrono::Utc::now().timestamp();
        tx.execute(
            "INSERT INTO transactions (user_id, symbol, action, quantity, price, total, created_at)
             VALUES (?1, ?2, 'sell', ?3, ?4, ?5, ?6)",
            params![user_id, symbol, quantity, price, total, now],
        )?;
        tx.commit()?;

        debug!("{} sold {} {} at {}", user_id, quantity, symbol, price);
        Ok(SellOutcome::Executed(TradeExecution {
            price,
            total,
            balance_after: balance + total,
            quantity_after,
            avg_price_after: avg_price,
            realized_pnl: Some((price - avg_price) * quantity),
        }))
    }

    /// Most recent trades for a user, newest first.
    pub fn recent_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, symbol, action, quantity, price, total, created_at
             FROM transactions WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], transaction_from_row)?;
        rows.collect()
    }

    // ========== Price Cache Methods ==========

    /// Cached quote for a symbol, if one exists and is younger than
    /// `max_age_ms`.
    pub fn cached_quote(
        &self,
        symbol: &str,
        max_age_ms: i64,
    ) -> Result<Option<Quote>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let cutoff = chrono::Utc::now().timestamp_millis() - max_age_ms;

        let result = conn.query_row(
            "SELECT symbol, price, change_percent FROM price_cache
             WHERE symbol = ?1 AND fetched_at >= ?2",
            params![symbol, cutoff],
            |row| {
                let symbol: String = row.get(0)?;
                let price: f64 = row.get(1)?;
                let change_percent: f64 = row.get(2)?;
                Ok(Quote::new(symbol, price, change_percent, QuoteOrigin::Cached))
            },
        );

        match result {
            Ok(quote) => Ok(Some(quote)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store a quote, replacing any previous entry for the symbol.
    pub fn cache_quote(&self, quote: &Quote) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO price_cache (symbol, price, change_percent, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                quote.symbol,
                quote.price,
                quote.change_percent,
                chrono::Utc::now().timestamp_millis()
            ],
        )?;
        Ok(())
    }
}

/// Result of attempting to place a market stake.
#[derive(Debug)]
pub enum StakeOutcome {
    Placed(Investment),
    /// No open round, or no option with that class and symbol in it
    UnknownOption,
    ShortFunds { needed: f64, available: f64 },
}

/// Result of settling a round.
#[derive(Debug)]
pub enum SettleOutcome {
    /// The round had no unsettled stakes; nothing was written
    NothingStaked,
    Settled {
        stakes: Vec<SettledStake>,
        next_round: Round,
    },
}

/// One settled stake joined with the option it was placed on.
#[derive(Debug, Clone)]
pub struct SettledStake {
    pub user_id: String,
    pub username: String,
    pub class: MarketClass,
    pub symbol: String,
    pub name: String,
    pub amount: f64,
    pub multiplier: f64,
    pub outcome: Outcome,
    pub payout: f64,
}

/// Result of attempting a stock purchase.
#[derive(Debug)]
pub enum BuyOutcome {
    Executed(TradeExecution),
    ShortFunds { needed: f64, available: f64 },
}

/// Result of attempting a stock sale.
#[derive(Debug)]
pub enum SellOutcome {
    Executed(TradeExecution),
    ShortShares { requested: f64, held: f64 },
}

/// The numbers behind an executed trade.
#[derive(Debug, Clone)]
pub struct TradeExecution {
    pub price: f64,
    pub total: f64,
    pub balance_after: f64,
    pub quantity_after: f64,
    pub avg_price_after: f64,
    /// Only present on sells
    pub realized_pnl: Option<f64>,
}

/// Insert a round and its options inside an open transaction. Shared by
/// round creation and settlement so both write the catalog the same way.
fn insert_round(
    tx: &rusqlite::Transaction<'_>,
    round_number: i64,
    mood: &str,
    options: &[NewMarketOption],
) -> Result<Round, rusqlite::Error> {
    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO market_rounds (round_number, mood, created_at) VALUES (?1, ?2, ?3)",
        params![round_number, mood, now],
    )?;
    let round_id = tx.last_insert_rowid();
    for opt in options {
        tx.execute(
            "INSERT INTO market_options (round_id, class, symbol, name, multiplier, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                round_id,
                opt.class.as_str(),
                opt.symbol,
                opt.name,
                opt.multiplier,
                opt.outcome.as_str()
            ],
        )?;
    }
    Ok(Round {
        id: round_id,
        round_number,
        mood: mood.to_string(),
        created_at: now,
    })
}

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        balance: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn round_from_row(row: &rusqlite::Row<'_>) -> Result<Round, rusqlite::Error> {
    Ok(Round {
        id: row.get(0)?,
        round_number: row.get(1)?,
        mood: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn option_from_row(row: &rusqlite::Row<'_>) -> Result<MarketOption, rusqlite::Error> {
    Ok(MarketOption {
        id: row.get(0)?,
        round_id: row.get(1)?,
        class: parse_class(2, row.get(2)?)?,
        symbol: row.get(3)?,
        name: row.get(4)?,
        multiplier: row.get(5)?,
        outcome: parse_outcome(6, row.get(6)?)?,
    })
}

fn investment_from_row(row: &rusqlite::Row<'_>) -> Result<Investment, rusqlite::Error> {
    Ok(Investment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        round_id: row.get(2)?,
        option_id: row.get(3)?,
        class: parse_class(4, row.get(4)?)?,
        symbol: row.get(5)?,
        amount: row.get(6)?,
        settled: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn transaction_from_row(row: &rusqlite::Row<'_>) -> Result<TransactionRecord, rusqlite::Error> {
    Ok(TransactionRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        symbol: row.get(2)?,
        action: parse_action(3, row.get(3)?)?,
        quantity: row.get(4)?,
        price: row.get(5)?,
        total: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn holding_from_row(row: &rusqlite::Row<'_>) -> Result<Holding, rusqlite::Error> {
    Ok(Holding {
        user_id: row.get(0)?,
        symbol: row.get(1)?,
        quantity: row.get(2)?,
        avg_price: row.get(3)?,
    })
}

/// Stored labels must always map back to a variant. Anything else surfaces
/// as a conversion error, never a silent default.
fn parse_class(idx: usize, s: String) -> Result<MarketClass, rusqlite::Error> {
    s.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn parse_outcome(idx: usize, s: String) -> Result<Outcome, rusqlite::Error> {
    s.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn parse_action(idx: usize, s: String) -> Result<TradeAction, rusqlite::Error> {
    s.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}
