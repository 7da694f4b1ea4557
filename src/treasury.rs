//! Treasury: value leaving the engine
//!
//! Player and owner withdrawals, teardown, and the liquidity guard that keeps
//! player obligations payable. Transfers go through a [`Custody`] before any
//! ledger change, so a failed transfer leaves the engine untouched.

use crate::errors::{TransferError, TreasuryError};
use crate::ledger::BalanceLedger;
use crate::roulette::{Amount, PlayerId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Outbound value transfers
pub trait Custody: Send {
    fn transfer_out(&mut self, to: &PlayerId, amount: Amount) -> Result<(), TransferError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: PlayerId,
    pub amount: Amount,
}

/// Custody that records transfers in memory. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustody {
    transfers: Arc<Mutex<Vec<Transfer>>>,
    reject: Arc<AtomicBool>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following transfer fail until re-enabled
    pub fn set_rejecting(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.transfers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn total_sent_to(&self, to: &PlayerId) -> Amount {
        self.transfers()
            .iter()
            .filter(|t| &t.to == to)
            .map(|t| t.amount)
            .sum()
    }
}

impl Custody for InMemoryCustody {
    fn transfer_out(&mut self, to: &PlayerId, amount: Amount) -> Result<(), TransferError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(TransferError::Failed {
                to: to.clone(),
                amount,
                reason: "custody is rejecting transfers".to_string(),
            });
        }
        self.transfers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Transfer {
                to: to.clone(),
                amount,
            });
        Ok(())
    }
}

pub fn ensure_owner(owner: &PlayerId, caller: &PlayerId) -> Result<(), TreasuryError> {
    if owner != caller {
        return Err(TreasuryError::Unauthorized {
            caller: caller.clone(),
        });
    }
    Ok(())
}

/// Amount a player withdrawal pays: the balance, bounded by liquid funds
pub fn player_payout(ledger: &BalanceLedger, player: &PlayerId) -> Amount {
    ledger.balance_of(player).min(ledger.liquid_funds())
}

/// Amount an owner withdrawal may take given the worst-case credit of unresolved bets
pub fn owner_payout(ledger: &BalanceLedger, exposure: u128) -> Result<Amount, TreasuryError> {
    let house = ledger.house();
    if house == 0 {
        return Ok(0);
    }
    if house < 0 {
        return Err(TreasuryError::InsufficientLiquidity {
            available: house,
            required: 0,
        });
    }

    let remaining = ledger.total_funds() as i128 - house;
    let owed = ledger.players_total() as i128 + exposure.min(i128::MAX as u128) as i128;
    if remaining < owed {
        return Err(TreasuryError::InsufficientLiquidity {
            available: remaining,
            required: owed,
        });
    }
    Ok(house as Amount)
}

/// Teardown is allowed only when nothing is owed to anyone but the owner
pub fn ensure_closable(
    ledger: &BalanceLedger,
    is_idle: bool,
    has_unresolved_bets: bool,
) -> Result<(), TreasuryError> {
    let owed = ledger.players_total() as i128 + ledger.money_in_bank() as i128;
    if !is_idle || has_unresolved_bets || owed > 0 || ledger.house() < 0 {
        return Err(TreasuryError::InsufficientLiquidity {
            available: ledger.house(),
            required: owed,
        });
    }
    Ok(())
}
