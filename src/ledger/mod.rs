//! Bet queue and balance accounting

pub mod balances;
pub mod bets;

pub use balances::{BalanceLedger, BalanceUpdate};
pub use bets::BetLedger;
