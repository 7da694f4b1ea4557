//! Error types for the roulette engine
//!
//! Every failing operation returns one of these and leaves the engine untouched.
//! Errors are grouped by concern and wrapped by [`EngineError`].

use crate::roulette::types::{Amount, PlayerId, RequestId};
use serde::{Deserialize, Serialize};

/// Coarse classification used by callers to decide whether to retry or correct input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Caller-correctable input problems
    Validation,
    /// Protocol misuse of the start/deliver cycle
    Scheduling,
    /// Business-rule rejection protecting player funds
    Guard,
    /// An external collaborator refused the request
    Collaborator,
    /// The engine has been torn down
    Lifecycle,
    /// Configuration or arithmetic failures
    Internal,
}

/// Bet validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BetError {
    #[error("Stake {stake} is below the minimal stake {minimum}")]
    InsufficientStake { stake: Amount, minimum: Amount },

    #[error("Stake {stake} exceeds the maximal stake {maximum}")]
    StakeTooLarge { stake: Amount, maximum: Amount },

    #[error("Malformed {category} bet on {numbers:?}: {reason}")]
    MalformedBet {
        category: String,
        numbers: Vec<u8>,
        reason: String,
    },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },
}

/// Round scheduling errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("Round is not ready to start")]
    NotReady,

    #[error("Round already in flight awaiting request {request_id}")]
    RoundAlreadyInFlight { request_id: RequestId },

    #[error("Unknown randomness request {request_id}")]
    UnknownRequest { request_id: RequestId },
}

/// Treasury guard errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreasuryError {
    #[error("Insufficient liquidity: {available} available, {required} required")]
    InsufficientLiquidity { available: i128, required: i128 },

    #[error("Caller {caller} is not the owner")]
    Unauthorized { caller: PlayerId },
}

/// Randomness provider errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RandomnessError {
    #[error("Randomness request {0} rejected: {1}")]
    RequestRejected(RequestId, String),

    #[error("Randomness request {0} is not pending")]
    NotPending(RequestId),

    #[error("Timed out after {timeout_ms}ms waiting for request {request_id}")]
    Timeout { request_id: RequestId, timeout_ms: u64 },

    #[error("Wait for request {0} was cancelled")]
    Cancelled(RequestId),

    #[error("VRF failure: {0}")]
    Vrf(String),
}

/// Outbound value transfer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Transfer of {amount} to {to} failed: {reason}")]
    Failed {
        to: PlayerId,
        amount: Amount,
        reason: String,
    },
}

/// Configuration and validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

/// Root error type for all engine operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Bet rejected: {0}")]
    Bet(#[from] BetError),

    #[error("Round error: {0}")]
    Round(#[from] RoundError),

    #[error("Treasury error: {0}")]
    Treasury(#[from] TreasuryError),

    #[error("Randomness error: {0}")]
    Randomness(#[from] RandomnessError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Engine is closed")]
    EngineClosed,

    #[error("Arithmetic overflow while {0}")]
    ArithmeticOverflow(&'static str),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Bet(_) => ErrorKind::Validation,
            EngineError::Round(_) => ErrorKind::Scheduling,
            EngineError::Treasury(_) => ErrorKind::Guard,
            EngineError::Randomness(_) | EngineError::Transfer(_) => ErrorKind::Collaborator,
            EngineError::EngineClosed => ErrorKind::Lifecycle,
            EngineError::Configuration(_) | EngineError::ArithmeticOverflow(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<toml::de::Error> for ConfigurationError {
    fn from(e: toml::de::Error) -> Self {
        ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

/// Convenience type alias for Results
pub type EngineResult<T> = Result<T, EngineError>;
