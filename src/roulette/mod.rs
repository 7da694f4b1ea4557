//! Table domain: board layout, bet categories and the payout table

pub mod board;
pub mod payout;
pub mod types;

pub use payout::{BetCategory, Coverage, EvenMoneyGroup, Payout};
pub use types::{Amount, Bet, EngineSnapshot, PlayerId, RequestId, RoundPhase, Timestamp};
