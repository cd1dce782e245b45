//! Market Round Service
//!
//! Runs the investment game: opens rounds with a ten-option catalog (five
//! generated memecoins, five stocks sampled from a fixed universe), takes
//! stakes against the open round, and settles in one shot, crediting
//! payouts and opening the next round atomically.
//!
//! Every option's outcome is drawn when the catalog is written, so a
//! round's results are fixed from the moment it opens. Settlement only
//! reveals them.

use crate::services::names;
use crate::services::outcomes;
use crate::services::sqlite_store::{SettleOutcome, SettledStake, SqliteStore, StakeOutcome};
use crate::types::market::{
    Investment, MarketClass, MarketOption, MarketView, NewMarketOption, Round, SettlementLine,
    SettlementReport, UserSettlement,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Synthetic memecoins per round.
const CRYPTO_PER_ROUND: usize = 5;

/// Business stocks sampled per round.
const BUSINESS_PER_ROUND: usize = 5;

/// The universe the business half of each catalog is sampled from.
const BUSINESS_UNIVERSE: [(&str, &str); 10] = [
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("TSLA", "Tesla Inc."),
    ("META", "Meta Platforms Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("NFLX", "Netflix Inc."),
    ("JPM", "JPMorgan Chase & Co."),
    ("DIS", "The Walt Disney Company"),
];

/// Market service errors.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("No {class} option {symbol} this round (available: {})", .available.join(", "))]
    UnknownOption {
        class: MarketClass,
        symbol: String,
        available: Vec<String>,
    },

    #[error("Insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("Nothing staked in the current round")]
    NoInvestments,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for MarketError {
    fn from(e: rusqlite::Error) -> Self {
        MarketError::DatabaseError(e.to_string())
    }
}

/// Coordinates rounds, stakes, and settlement on top of the store.
pub struct MarketService {
    store: Arc<SqliteStore>,
    starting_balance: f64,
}

impl MarketService {
    pub fn new(store: Arc<SqliteStore>, starting_balance: f64) -> Self {
        Self {
            store,
            starting_balance,
        }
    }

    /// The open round, creating round 1 with a fresh catalog when the
    /// database has none.
    pub fn ensure_open_round(&self) -> Result<Round, MarketError> {
        if let Some(round) = self.store.current_round()? {
            return Ok(round);
        }
        let mut rng = rand::thread_rng();
        let mood = names::pick_mood(&mut rng);
        let catalog = generate_catalog(&mut rng);
        Ok(self.store.create_round(1, &mood, &catalog)?)
    }

    /// The current catalog as players see it: symbols and names only,
    /// multipliers and outcomes held back.
    pub fn market_view(&self) -> Result<MarketView, MarketError> {
        let round = self.ensure_open_round()?;
        let options = self.store.round_options(round.id)?;
        Ok(build_view(&round, &options))
    }

    /// Stake an amount on one option of the open round.
    ///
    /// Creates the user on first sight. The store resolves the open round
    /// inside the stake transaction itself, so a stake racing a settlement
    /// binds to the round that is open when it commits, never to one that
    /// just closed.
    pub fn stake(
        &self,
        user_id: &str,
        username: &str,
        class: MarketClass,
        symbol: &str,
        amount: f64,
    ) -> Result<Investment, MarketError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(MarketError::InvalidAmount(amount));
        }
        self.store
            .ensure_user(user_id, username, self.starting_balance)?;
        self.ensure_open_round()?;
        let symbol = symbol.to_uppercase();

        match self.store.stake(user_id, class, &symbol, amount)? {
            StakeOutcome::Placed(investment) => Ok(investment),
            StakeOutcome::UnknownOption => {
                let round = self.ensure_open_round()?;
                let available = self
                    .store
                    .round_options(round.id)?
                    .iter()
                    .filter(|opt| opt.class == class)
                    .map(|opt| opt.symbol.clone())
                    .collect();
                Err(MarketError::UnknownOption {
                    class,
                    symbol,
                    available,
                })
            }
            StakeOutcome::ShortFunds { needed, available } => {
                Err(MarketError::InsufficientFunds { needed, available })
            }
        }
    }

    /// A user's unsettled stakes in the open round.
    pub fn pending_investments(&self, user_id: &str) -> Result<Vec<Investment>, MarketError> {
        let round = self.ensure_open_round()?;
        Ok(self.store.user_investments(user_id, round.id)?)
    }

    /// Settle the open round and open the next one.
    ///
    /// Refuses to settle a round nobody staked in; the open round stays
    /// exactly as it was in that case.
    pub fn settle(&self) -> Result<SettlementReport, MarketError> {
        let round = self.ensure_open_round()?;
        let (next_mood, next_catalog) = {
            let mut rng = rand::thread_rng();
            (names::pick_mood(&mut rng), generate_catalog(&mut rng))
        };

        match self.store.settle_round(
            round.id,
            round.round_number + 1,
            &next_mood,
            &next_catalog,
        )? {
            SettleOutcome::NothingStaked => Err(MarketError::NoInvestments),
            SettleOutcome::Settled { stakes, next_round } => {
                let report = build_report(round.round_number, next_round.round_number, stakes);
                info!(
                    "Round {} settled: {:.2} staked, {:.2} paid out to {} users",
                    report.round_number,
                    report.total_staked,
                    report.total_paid_out,
                    report.users.len()
                );
                Ok(report)
            }
        }
    }
}

/// Draw a full catalog: generated memecoins plus a shuffled sample of the
/// business universe, each option's outcome fixed on the spot.
fn generate_catalog(rng: &mut impl Rng) -> Vec<NewMarketOption> {
    let mut options = Vec::with_capacity(CRYPTO_PER_ROUND + BUSINESS_PER_ROUND);

    for _ in 0..CRYPTO_PER_ROUND {
        let (symbol, name) = names::generate_coin(rng);
        let outcome = outcomes::draw(MarketClass::Crypto, rng);
        options.push(NewMarketOption {
            class: MarketClass::Crypto,
            symbol,
            name,
            multiplier: outcome.multiplier(),
            outcome,
        });
    }

    let mut universe = BUSINESS_UNIVERSE.to_vec();
    universe.shuffle(rng);
    for (symbol, name) in universe.into_iter().take(BUSINESS_PER_ROUND) {
        let outcome = outcomes::draw(MarketClass::Business, rng);
        options.push(NewMarketOption {
            class: MarketClass::Business,
            symbol: symbol.to_string(),
            name: name.to_string(),
            multiplier: outcome.multiplier(),
            outcome,
        });
    }

    options
}

fn build_view(round: &Round, options: &[MarketOption]) -> MarketView {
    let mut crypto = Vec::new();
    let mut business = Vec::new();
    for opt in options {
        match opt.class {
            MarketClass::Crypto => crypto.push(opt.into()),
            MarketClass::Business => business.push(opt.into()),
        }
    }
    MarketView {
        round_number: round.round_number,
        mood: round.mood.clone(),
        crypto,
        business,
    }
}

/// Fold settled stakes into per-user results, preserving first-seen order.
fn build_report(
    round_number: i64,
    next_round_number: i64,
    stakes: Vec<SettledStake>,
) -> SettlementReport {
    let mut users: Vec<UserSettlement> = Vec::new();
    let mut total_staked = 0.0;
    let mut total_paid_out = 0.0;

    for stake in stakes {
        total_staked += stake.amount;
        total_paid_out += stake.payout;

        let line = SettlementLine {
            class: stake.class,
            symbol: stake.symbol,
            name: stake.name,
            amount: stake.amount,
            multiplier: stake.multiplier,
            outcome: stake.outcome,
            payout: stake.payout,
        };

        match users.iter().position(|u| u.user_id == stake.user_id) {
            Some(idx) => {
                let user = &mut users[idx];
                user.total_staked += line.amount;
                user.total_payout += line.payout;
                user.net = user.total_payout - user.total_staked;
                user.lines.push(line);
            }
            None => users.push(UserSettlement {
                user_id: stake.user_id,
                username: stake.username,
                total_staked: line.amount,
                total_payout: line.payout,
                net: line.payout - line.amount,
                lines: vec![line],
            }),
        }
    }

    SettlementReport {
        round_number,
        next_round_number,
        total_staked,
        total_paid_out,
        users,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MarketService {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        MarketService::new(store, 1000.0)
    }

    fn crypto_symbol(svc: &MarketService) -> String {
        svc.market_view().unwrap().crypto[0].symbol.clone()
    }

    #[test]
    fn test_first_round_opens_with_full_catalog() {
        let svc = service();
        let view = svc.market_view().unwrap();
        assert_eq!(view.round_number, 1);
        assert_eq!(view.crypto.len(), 5);
        assert_eq!(view.business.len(), 5);
        assert!(view.crypto.iter().all(|o| o.class == MarketClass::Crypto));
        assert!(view
            .business
            .iter()
            .all(|o| o.class == MarketClass::Business));
        for opt in &view.business {
            assert!(BUSINESS_UNIVERSE.iter().any(|(s, _)| *s == opt.symbol));
        }
    }

    #[test]
    fn test_business_sample_has_no_duplicates() {
        let svc = service();
        let view = svc.market_view().unwrap();
        let mut symbols: Vec<&str> = view.business.iter().map(|o| o.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), 5);
    }

    #[test]
    fn test_stake_rejects_bad_amounts() {
        let svc = service();
        let symbol = crypto_symbol(&svc);
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = svc
                .stake("u1", "alice", MarketClass::Crypto, &symbol, amount)
                .unwrap_err();
            assert!(matches!(err, MarketError::InvalidAmount(_)));
        }
    }

    #[test]
    fn test_stake_unknown_symbol_lists_catalog() {
        let svc = service();
        let err = svc
            .stake("u1", "alice", MarketClass::Crypto, "NOPE", 50.0)
            .unwrap_err();
        match err {
            MarketError::UnknownOption {
                class, available, ..
            } => {
                assert_eq!(class, MarketClass::Crypto);
                assert_eq!(available.len(), 5);
            }
            other => panic!("expected UnknownOption, got {:?}", other),
        }
    }

    #[test]
    fn test_stake_never_overdraws() {
        let svc = service();
        let symbol = crypto_symbol(&svc);
        let err = svc
            .stake("u1", "alice", MarketClass::Crypto, &symbol, 1500.0)
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::InsufficientFunds {
                needed,
                available
            } if needed == 1500.0 && available == 1000.0
        ));
        // The failed stake left the balance untouched.
        let inv = svc
            .stake("u1", "alice", MarketClass::Crypto, &symbol, 1000.0)
            .unwrap();
        assert_eq!(inv.amount, 1000.0);
    }

    #[test]
    fn test_stake_binds_to_current_round() {
        let svc = service();
        let symbol = crypto_symbol(&svc);
        let inv = svc
            .stake("u1", "alice", MarketClass::Crypto, &symbol, 100.0)
            .unwrap();
        let round = svc.ensure_open_round().unwrap();
        assert_eq!(inv.round_id, round.id);
        assert!(!inv.settled);

        let pending = svc.pending_investments("u1").unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].symbol, symbol);
    }

    #[test]
    fn test_settle_with_nothing_staked_is_refused() {
        let svc = service();
        let before = svc.ensure_open_round().unwrap();
        let err = svc.settle().unwrap_err();
        assert!(matches!(err, MarketError::NoInvestments));
        // The open round did not advance.
        let after = svc.ensure_open_round().unwrap();
        assert_eq!(after.round_number, before.round_number);
    }

    #[test]
    fn test_settle_pays_stake_times_multiplier() {
        let svc = service();
        let symbol = crypto_symbol(&svc);
        svc.stake("u1", "alice", MarketClass::Crypto, &symbol, 200.0)
            .unwrap();

        let report = svc.settle().unwrap();
        assert_eq!(report.round_number, 1);
        assert_eq!(report.next_round_number, 2);
        assert_eq!(report.users.len(), 1);

        let user = &report.users[0];
        assert_eq!(user.total_staked, 200.0);
        let line = &user.lines[0];
        assert_eq!(line.payout, line.amount * line.multiplier);
        assert_eq!(line.multiplier, line.outcome.multiplier());
        assert_eq!(user.net, user.total_payout - user.total_staked);

        // Balance reflects the debit at stake time plus the settled payout.
        let user_row = svc.store.get_user("u1").unwrap().unwrap();
        assert!((user_row.balance - (1000.0 - 200.0 + user.total_payout)).abs() < 1e-9);
    }

    #[test]
    fn test_settle_opens_next_round_with_fresh_catalog() {
        let svc = service();
        let symbol = crypto_symbol(&svc);
        svc.stake("u1", "alice", MarketClass::Crypto, &symbol, 50.0)
            .unwrap();
        svc.settle().unwrap();

        let view = svc.market_view().unwrap();
        assert_eq!(view.round_number, 2);
        assert_eq!(view.crypto.len(), 5);
        assert_eq!(view.business.len(), 5);
        // Settled stakes no longer show as pending.
        assert!(svc.pending_investments("u1").unwrap().is_empty());
    }

    #[test]
    fn test_settle_aggregates_per_user() {
        let svc = service();
        let view = svc.market_view().unwrap();
        let c0 = view.crypto[0].symbol.clone();
        let c1 = view.crypto[1].symbol.clone();
        let b0 = view.business[0].symbol.clone();

        svc.stake("u1", "alice", MarketClass::Crypto, &c0, 100.0)
            .unwrap();
        svc.stake("u1", "alice", MarketClass::Crypto, &c1, 50.0)
            .unwrap();
        svc.stake("u2", "bob", MarketClass::Business, &b0, 75.0)
            .unwrap();

        let report = svc.settle().unwrap();
        assert_eq!(report.users.len(), 2);
        assert_eq!(report.total_staked, 225.0);

        let alice = &report.users[0];
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.lines.len(), 2);
        assert_eq!(alice.total_staked, 150.0);

        let bob = &report.users[1];
        assert_eq!(bob.username, "bob");
        assert_eq!(bob.lines.len(), 1);
        assert_eq!(bob.lines[0].class, MarketClass::Business);
    }

    #[test]
    fn test_stake_symbol_is_case_insensitive() {
        let svc = service();
        let symbol = crypto_symbol(&svc);
        let inv = svc
            .stake(
                "u1",
                "alice",
                MarketClass::Crypto,
                &symbol.to_lowercase(),
                25.0,
            )
            .unwrap();
        assert_eq!(inv.symbol, symbol);
    }

    #[test]
    fn test_generate_catalog_multipliers_match_outcomes() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let catalog = generate_catalog(&mut rng);
            assert_eq!(catalog.len(), 10);
            for opt in &catalog {
                assert_eq!(opt.multiplier, opt.outcome.multiplier());
                assert_eq!(opt.class, opt.outcome.class());
            }
        }
    }
}
