//! Balance ledger
//!
//! Holds every unit of value the engine is responsible for. The house balance
//! is signed: winnings beyond the returned stake are paid out of it, so it goes
//! negative when the house has underwritten more than it holds. At every
//! quiescent point `total_funds == players_total + house + money_in_bank`.

use crate::errors::{BetError, EngineError, EngineResult};
use crate::roulette::{Amount, PlayerId};
use std::collections::HashMap;

/// Post-resolution values computed ahead of time and committed in one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub balances: Vec<(PlayerId, Amount)>,
    pub players_total: Amount,
    pub house: i128,
    pub money_in_bank: Amount,
}

#[derive(Debug, Clone)]
pub struct BalanceLedger {
    balances: HashMap<PlayerId, Amount>,
    players_total: Amount,
    house: i128,
    money_in_bank: Amount,
    total_funds: Amount,
}

fn overflow(context: &'static str) -> EngineError {
    EngineError::ArithmeticOverflow(context)
}

impl BalanceLedger {
    /// Ledger holding only the house bankroll
    pub fn new(initial_bankroll: Amount) -> Self {
        Self {
            balances: HashMap::new(),
            players_total: 0,
            house: initial_bankroll as i128,
            money_in_bank: 0,
            total_funds: initial_bankroll,
        }
    }

    pub fn balance_of(&self, player: &PlayerId) -> Amount {
        self.balances.get(player).copied().unwrap_or(0)
    }

    pub fn players_total(&self) -> Amount {
        self.players_total
    }

    pub fn house(&self) -> i128 {
        self.house
    }

    pub fn money_in_bank(&self) -> Amount {
        self.money_in_bank
    }

    pub fn total_funds(&self) -> Amount {
        self.total_funds
    }

    /// Funds not tied up in unresolved bets
    pub fn liquid_funds(&self) -> Amount {
        self.total_funds.saturating_sub(self.money_in_bank)
    }

    /// Non-zero player balances ordered by player
    pub fn balances(&self) -> Vec<(PlayerId, Amount)> {
        let mut entries: Vec<_> = self
            .balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(player, amount)| (player.clone(), *amount))
            .collect();
        entries.sort();
        entries
    }

    pub fn is_conserved(&self) -> bool {
        self.total_funds as i128
            == self.players_total as i128 + self.house + self.money_in_bank as i128
    }

    /// Stake received as transferred value
    pub fn receive_stake(&mut self, stake: Amount) -> EngineResult<()> {
        let total_funds = self
            .total_funds
            .checked_add(stake)
            .ok_or_else(|| overflow("receiving a stake"))?;
        let money_in_bank = self
            .money_in_bank
            .checked_add(stake)
            .ok_or_else(|| overflow("banking a stake"))?;
        self.total_funds = total_funds;
        self.money_in_bank = money_in_bank;
        Ok(())
    }

    /// Stake debited from the staker's withdrawable balance
    pub fn stake_from_balance(&mut self, player: &PlayerId, stake: Amount) -> EngineResult<()> {
        let available = self.balance_of(player);
        if available < stake {
            return Err(BetError::InsufficientBalance {
                requested: stake,
                available,
            }
            .into());
        }
        let money_in_bank = self
            .money_in_bank
            .checked_add(stake)
            .ok_or_else(|| overflow("banking a stake"))?;
        self.set_balance(player, available - stake);
        self.players_total -= stake;
        self.money_in_bank = money_in_bank;
        Ok(())
    }

    pub fn deposit(&mut self, player: &PlayerId, amount: Amount) -> EngineResult<Amount> {
        let balance = self
            .balance_of(player)
            .checked_add(amount)
            .ok_or_else(|| overflow("crediting a deposit"))?;
        let players_total = self
            .players_total
            .checked_add(amount)
            .ok_or_else(|| overflow("crediting a deposit"))?;
        let total_funds = self
            .total_funds
            .checked_add(amount)
            .ok_or_else(|| overflow("receiving a deposit"))?;
        self.set_balance(player, balance);
        self.players_total = players_total;
        self.total_funds = total_funds;
        Ok(balance)
    }

    pub fn fund_house(&mut self, amount: Amount) -> EngineResult<i128> {
        let total_funds = self
            .total_funds
            .checked_add(amount)
            .ok_or_else(|| overflow("funding the house"))?;
        self.house += amount as i128;
        self.total_funds = total_funds;
        Ok(self.house)
    }

    /// Remove value paid out to a player. Callers bound `amount` by the balance.
    pub fn debit_player(&mut self, player: &PlayerId, amount: Amount) {
        let balance = self.balance_of(player);
        debug_assert!(amount <= balance && amount <= self.total_funds);
        self.set_balance(player, balance - amount);
        self.players_total -= amount;
        self.total_funds -= amount;
    }

    /// Remove the positive house balance, returning the amount taken
    pub fn take_house(&mut self) -> Amount {
        let amount = self.house.clamp(0, self.total_funds as i128) as Amount;
        self.house -= amount as i128;
        self.total_funds -= amount;
        amount
    }

    /// Empty the ledger, returning everything that was held
    pub fn drain(&mut self) -> Amount {
        let held = self.total_funds;
        self.balances.clear();
        self.players_total = 0;
        self.house = 0;
        self.money_in_bank = 0;
        self.total_funds = 0;
        held
    }

    /// Apply precomputed resolution results. Total funds are unchanged by resolution.
    pub fn commit(&mut self, update: BalanceUpdate) {
        for (player, balance) in update.balances {
            self.set_balance(&player, balance);
        }
        self.players_total = update.players_total;
        self.house = update.house;
        self.money_in_bank = update.money_in_bank;
    }

    fn set_balance(&mut self, player: &PlayerId, balance: Amount) {
        if balance == 0 {
            self.balances.remove(player);
        } else {
            self.balances.insert(player.clone(), balance);
        }
    }
}
