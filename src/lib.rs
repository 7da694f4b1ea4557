//! Roulette Engine - single-zero wagering and settlement
//!
//! Players stake value on groupings of the 37 pockets. A round captures every
//! queued bet, asks an external source for one random value, and settles all
//! of the round's bets atomically when that value is delivered. Balances are
//! kept so that the funds held always equal player balances plus the house
//! balance plus stakes still in play.

pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod keeper;
pub mod ledger;
pub mod metrics;
pub mod randomness;
pub mod round;
pub mod roulette;
pub mod treasury;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigLoader, EngineConfig};
pub use engine::RouletteEngine;
pub use errors::{EngineError, EngineResult, ErrorKind};
pub use events::EngineEvent;
pub use keeper::RoundKeeper;
pub use randomness::{QueuedRandomness, RandomnessProvider, RecordingRandomness};
pub use round::RoundOutcome;
pub use roulette::{
    Amount, Bet, BetCategory, EngineSnapshot, EvenMoneyGroup, Payout, PlayerId, RequestId,
    RoundPhase,
};
pub use treasury::{Custody, InMemoryCustody};
