//! Bet ledger
//!
//! Bets accepted while a round is awaiting its outcome stay in the queue and
//! are resolved by the next round. The in-flight set is captured at round start.

use crate::roulette::{Amount, Bet, BetCategory, PlayerId};

#[derive(Debug, Clone)]
pub struct BetLedger {
    queued: Vec<Bet>,
    in_flight: Vec<Bet>,
    next_bet_id: u64,
}

impl BetLedger {
    pub fn new() -> Self {
        Self {
            queued: Vec::new(),
            in_flight: Vec::new(),
            next_bet_id: 1,
        }
    }

    /// Append a validated bet to the queue and return it
    pub fn push(
        &mut self,
        staker: PlayerId,
        stake: Amount,
        category: BetCategory,
        numbers: Vec<u8>,
    ) -> Bet {
        let bet = Bet {
            bet_id: self.next_bet_id,
            staker,
            stake,
            category,
            numbers,
        };
        self.next_bet_id += 1;
        self.queued.push(bet.clone());
        bet
    }

    pub fn queued(&self) -> &[Bet] {
        &self.queued
    }

    pub fn in_flight(&self) -> &[Bet] {
        &self.in_flight
    }

    pub fn has_queued(&self) -> bool {
        !self.queued.is_empty()
    }

    /// No bet is queued or awaiting an outcome
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty() && self.in_flight.is_empty()
    }

    pub fn queued_stake(&self) -> Option<Amount> {
        sum_stakes(&self.queued)
    }

    pub fn in_flight_stake(&self) -> Option<Amount> {
        sum_stakes(&self.in_flight)
    }

    /// Every bet that has not been resolved, in-flight first
    pub fn unresolved(&self) -> impl Iterator<Item = &Bet> {
        self.in_flight.iter().chain(self.queued.iter())
    }

    /// Move the queue into the in-flight snapshot, returning the number of bets captured
    pub fn capture(&mut self) -> usize {
        debug_assert!(self.in_flight.is_empty(), "previous round was never resolved");
        self.in_flight = std::mem::take(&mut self.queued);
        self.in_flight.len()
    }

    /// Consume the in-flight snapshot once it has been settled
    pub fn take_in_flight(&mut self) -> Vec<Bet> {
        std::mem::take(&mut self.in_flight)
    }
}

impl Default for BetLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_stakes(bets: &[Bet]) -> Option<Amount> {
    bets.iter().try_fold(0u64, |acc, bet| acc.checked_add(bet.stake))
}
