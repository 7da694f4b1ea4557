use crate::roulette::payout::BetCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value in the smallest currency unit
pub type Amount = u64;

/// Seconds since the Unix epoch
pub type Timestamp = u64;

/// Staker identity (wallet address or session ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque identifier correlating a randomness request with its callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A staked wager. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub bet_id: u64,
    pub staker: PlayerId,
    pub stake: Amount,
    pub category: BetCategory,
    pub numbers: Vec<u8>,
}

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RoundPhase {
    Idle,
    AwaitingOutcome { round_id: u64, request_id: RequestId },
    Closed,
}

impl RoundPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, RoundPhase::Idle)
    }

    pub fn outstanding_request(&self) -> Option<RequestId> {
        match self {
            RoundPhase::AwaitingOutcome { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Idle => write!(f, "idle"),
            RoundPhase::AwaitingOutcome { round_id, request_id } => {
                write!(f, "awaiting outcome (round {}, request {})", round_id, request_id)
            }
            RoundPhase::Closed => write!(f, "closed"),
        }
    }
}

/// Read-only view of every ledger and round field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub phase: RoundPhase,
    pub total_funds: Amount,
    pub players_total: Amount,
    pub house_balance: i128,
    pub money_in_bank: Amount,
    pub pending_bets: Vec<Bet>,
    pub in_flight_bets: Vec<Bet>,
    pub balances: Vec<(PlayerId, Amount)>,
    pub last_winning_number: Option<u8>,
    pub last_resolved_at: Timestamp,
    pub rounds_completed: u64,
}
