//! Round resolution
//!
//! A random value becomes a winning number, and every bet of the in-flight
//! snapshot is settled against it. Settlement is planned in full with checked
//! arithmetic before the balance ledger is touched.

use crate::errors::{EngineError, EngineResult};
use crate::ledger::{BalanceLedger, BalanceUpdate};
use crate::roulette::board::BOARD_SIZE;
use crate::roulette::payout::{self, Payout};
use crate::roulette::{Amount, Bet, PlayerId, RequestId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub fn winning_number(random_value: u64) -> u8 {
    (random_value % BOARD_SIZE as u64) as u8
}

/// How one bet was settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSettlement {
    pub bet_id: u64,
    pub staker: PlayerId,
    pub stake: Amount,
    pub payout: Payout,
    /// Stake plus winnings for a win, zero for a loss
    pub credited: Amount,
}

/// Result of a resolved round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round_id: u64,
    pub request_id: RequestId,
    pub random_value: u64,
    pub winning_number: u8,
    pub settlements: Vec<BetSettlement>,
    pub total_staked: Amount,
    pub total_credited: Amount,
    /// Change of the house balance caused by this round
    pub house_delta: i128,
}

/// Settlement computed but not yet applied
#[derive(Debug, Clone)]
pub struct SettlementPlan {
    pub settlements: Vec<BetSettlement>,
    pub update: BalanceUpdate,
    pub total_staked: Amount,
    pub total_credited: Amount,
    pub house_delta: i128,
}

fn overflow(context: &'static str) -> EngineError {
    EngineError::ArithmeticOverflow(context)
}

/// Settle `bets` against `winning_number` without mutating the ledger
pub fn plan(
    bets: &[Bet],
    ledger: &BalanceLedger,
    winning_number: u8,
) -> EngineResult<SettlementPlan> {
    let mut balances: HashMap<PlayerId, Amount> = HashMap::new();
    let mut order: Vec<PlayerId> = Vec::new();
    let mut players_total = ledger.players_total();
    let mut house = ledger.house();
    let mut money_in_bank = ledger.money_in_bank();
    let mut total_staked: Amount = 0;
    let mut total_credited: Amount = 0;
    let mut settlements = Vec::with_capacity(bets.len());

    for bet in bets {
        let outcome = payout::resolve(bet.category, &bet.numbers, winning_number)?;

        money_in_bank = money_in_bank
            .checked_sub(bet.stake)
            .ok_or_else(|| overflow("releasing a stake from the bank"))?;
        total_staked = total_staked
            .checked_add(bet.stake)
            .ok_or_else(|| overflow("summing stakes"))?;

        let credited = outcome
            .credit(bet.stake)
            .ok_or_else(|| overflow("computing a payout"))?;
        let winnings = outcome
            .winnings(bet.stake)
            .ok_or_else(|| overflow("computing winnings"))?;

        if outcome.is_win() {
            let balance = balances.entry(bet.staker.clone()).or_insert_with(|| {
                order.push(bet.staker.clone());
                ledger.balance_of(&bet.staker)
            });
            *balance = balance
                .checked_add(credited)
                .ok_or_else(|| overflow("crediting a winner"))?;
            players_total = players_total
                .checked_add(credited)
                .ok_or_else(|| overflow("crediting a winner"))?;
            total_credited = total_credited
                .checked_add(credited)
                .ok_or_else(|| overflow("summing credits"))?;
            house -= winnings as i128;
        } else {
            house += bet.stake as i128;
        }

        settlements.push(BetSettlement {
            bet_id: bet.bet_id,
            staker: bet.staker.clone(),
            stake: bet.stake,
            payout: outcome,
            credited,
        });
    }

    let house_delta = house - ledger.house();
    let balances = order
        .into_iter()
        .map(|player| {
            let balance = balances.get(&player).copied().unwrap_or(0);
            (player, balance)
        })
        .collect();

    Ok(SettlementPlan {
        settlements,
        update: BalanceUpdate {
            balances,
            players_total,
            house,
            money_in_bank,
        },
        total_staked,
        total_credited,
        house_delta,
    })
}

/// Largest amount the given bets could credit on any single spin
pub fn worst_case_credit<'a, I>(bets: I) -> EngineResult<u128>
where
    I: IntoIterator<Item = &'a Bet>,
{
    let mut per_number = [0u128; BOARD_SIZE as usize];
    for bet in bets {
        let covered = payout::coverage(bet.category, &bet.numbers)?;
        let credit = bet.stake as u128 * (bet.category.multiplier() as u128 + 1);
        for n in covered.numbers() {
            per_number[n as usize] += credit;
        }
    }
    Ok(per_number.iter().copied().max().unwrap_or(0))
}
