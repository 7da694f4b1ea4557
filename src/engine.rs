//! Roulette engine facade
//!
//! [`RouletteEngine`] owns every ledger and the round state. Each public
//! operation runs to completion under `&mut self` and either applies all of
//! its changes or none of them.

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::errors::{BetError, EngineError, EngineResult};
use crate::events::{EngineEvent, EventLog};
use crate::ledger::{BalanceLedger, BetLedger};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::randomness::RandomnessProvider;
use crate::round::resolution::{self, RoundOutcome};
use crate::round::RoundScheduler;
use crate::roulette::payout;
use crate::roulette::{
    Amount, Bet, BetCategory, EngineSnapshot, PlayerId, RequestId, RoundPhase, Timestamp,
};
use crate::treasury::{self, Custody};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub struct RouletteEngine {
    config: EngineConfig,
    owner: PlayerId,
    bets: BetLedger,
    balances: BalanceLedger,
    scheduler: RoundScheduler,
    events: EventLog,
    metrics: EngineMetrics,
    clock: Arc<dyn Clock>,
    randomness: Box<dyn RandomnessProvider>,
    custody: Box<dyn Custody>,
}

impl RouletteEngine {
    /// Build an engine holding the configured initial bankroll
    pub fn new(
        config: EngineConfig,
        randomness: Box<dyn RandomnessProvider>,
        clock: Arc<dyn Clock>,
        custody: Box<dyn Custody>,
    ) -> EngineResult<Self> {
        config.validate()?;

        let now = clock.now();
        let owner = config.owner();
        let scheduler = RoundScheduler::new(
            config.table.round_interval_secs,
            config.table.min_round_stake,
            now,
        );

        info!(
            owner = %owner,
            bankroll = config.table.initial_bankroll,
            min_stake = config.table.min_stake,
            max_stake = config.table.max_stake,
            "roulette engine created"
        );

        Ok(Self {
            balances: BalanceLedger::new(config.table.initial_bankroll),
            events: EventLog::new(config.monitoring.event_channel_capacity),
            bets: BetLedger::new(),
            metrics: EngineMetrics::new(),
            owner,
            scheduler,
            clock,
            randomness,
            custody,
            config,
        })
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.scheduler.phase() == RoundPhase::Closed {
            return Err(EngineError::EngineClosed);
        }
        Ok(())
    }

    fn check_bet(&self, category: BetCategory, numbers: &[u8], stake: Amount) -> Result<(), BetError> {
        let table = &self.config.table;
        if stake < table.min_stake {
            return Err(BetError::InsufficientStake {
                stake,
                minimum: table.min_stake,
            });
        }
        if stake > table.max_stake {
            return Err(BetError::StakeTooLarge {
                stake,
                maximum: table.max_stake,
            });
        }
        payout::validate(category, numbers)
    }

    fn reject<T>(&self, staker: &PlayerId, err: impl Into<EngineError>) -> EngineResult<T> {
        let err = err.into();
        self.metrics.record_rejection();
        warn!(player = %staker, kind = ?err.kind(), error = %err, "bet rejected");
        Err(err)
    }

    fn accept_bet(
        &mut self,
        staker: &PlayerId,
        category: BetCategory,
        numbers: &[u8],
        stake: Amount,
    ) -> Bet {
        let bet = self
            .bets
            .push(staker.clone(), stake, category, numbers.to_vec());
        self.metrics.record_bet(stake);
        debug!(
            bet_id = bet.bet_id,
            player = %staker,
            category = %category,
            stake,
            "bet accepted"
        );
        self.events.emit(EngineEvent::BetCreated { bet: bet.clone() });
        bet
    }

    /// Accept a bet paid for with `stake` transferred in alongside the call
    pub fn create_bet(
        &mut self,
        staker: &PlayerId,
        category: BetCategory,
        numbers: &[u8],
        stake: Amount,
    ) -> EngineResult<Bet> {
        self.ensure_open()?;
        if let Err(e) = self.check_bet(category, numbers, stake) {
            return self.reject(staker, e);
        }
        self.balances.receive_stake(stake)?;
        Ok(self.accept_bet(staker, category, numbers, stake))
    }

    /// Accept a bet paid for from the staker's withdrawable balance
    pub fn create_bet_from_balance(
        &mut self,
        staker: &PlayerId,
        category: BetCategory,
        numbers: &[u8],
        stake: Amount,
    ) -> EngineResult<Bet> {
        self.ensure_open()?;
        if let Err(e) = self.check_bet(category, numbers, stake) {
            return self.reject(staker, e);
        }
        if let Err(e) = self.balances.stake_from_balance(staker, stake) {
            return self.reject(staker, e);
        }
        Ok(self.accept_bet(staker, category, numbers, stake))
    }

    /// Credit transferred-in value to a staker, returning the new balance
    pub fn deposit_to_balance(&mut self, staker: &PlayerId, amount: Amount) -> EngineResult<Amount> {
        self.ensure_open()?;
        let balance = self.balances.deposit(staker, amount)?;
        debug!(player = %staker, amount, balance, "balance deposited");
        self.events.emit(EngineEvent::BalanceDeposited {
            player: staker.clone(),
            amount,
            balance,
        });
        Ok(balance)
    }

    pub fn is_ready(&self) -> bool {
        self.scheduler.is_ready(
            self.clock.now(),
            self.bets.has_queued(),
            self.balances.money_in_bank(),
        )
    }

    /// Capture the queued bets and request randomness for them
    pub fn start(&mut self) -> EngineResult<RequestId> {
        self.ensure_open()?;
        let (round_id, request_id) = self.scheduler.prepare(
            self.clock.now(),
            self.bets.has_queued(),
            self.balances.money_in_bank(),
        )?;

        if let Err(e) = self.randomness.request_random_value(request_id) {
            let err = EngineError::from(e);
            warn!(round_id, request_id = %request_id, kind = ?err.kind(), error = %err, "randomness request rejected");
            return Err(err);
        }

        // Nothing is in flight while idle, so the bank holds exactly the queued stake
        let total_stake = self.balances.money_in_bank();
        self.scheduler.begin(round_id, request_id);
        let bet_count = self.bets.capture();
        self.metrics.record_round_started();

        info!(round_id, request_id = %request_id, bet_count, total_stake, "round started");
        self.events.emit(EngineEvent::RoundStarted {
            round_id,
            request_id,
            bet_count,
            total_stake,
        });
        self.events
            .emit(EngineEvent::RandomnessRequested { request_id });

        Ok(request_id)
    }

    /// Resolve the in-flight round with the random value delivered for `request_id`
    pub fn deliver(&mut self, request_id: RequestId, random_value: u64) -> EngineResult<RoundOutcome> {
        self.ensure_open()?;
        let round_id = match self.scheduler.accept(request_id) {
            Ok(round_id) => round_id,
            Err(e) => {
                let err = EngineError::from(e);
                warn!(request_id = %request_id, kind = ?err.kind(), error = %err, "ignoring delivery for unknown request");
                return Err(err);
            }
        };

        let winning_number = resolution::winning_number(random_value);
        let plan = resolution::plan(self.bets.in_flight(), &self.balances, winning_number)?;

        self.balances.commit(plan.update);
        let settled = self.bets.take_in_flight();
        self.scheduler.finish(self.clock.now(), winning_number);
        self.metrics.record_round_finished(plan.total_credited);
        debug_assert!(self.balances.is_conserved(), "ledger out of balance after resolution");

        info!(
            round_id,
            request_id = %request_id,
            winning_number,
            bets = settled.len(),
            credited = plan.total_credited,
            house_delta = %plan.house_delta,
            "round finished"
        );
        self.events.emit(EngineEvent::RoundFinished {
            round_id,
            request_id,
            winning_number,
            bets_resolved: settled.len(),
            total_credited: plan.total_credited,
        });

        Ok(RoundOutcome {
            round_id,
            request_id,
            random_value,
            winning_number,
            settlements: plan.settlements,
            total_staked: plan.total_staked,
            total_credited: plan.total_credited,
            house_delta: plan.house_delta,
        })
    }

    /// Pay out the staker's balance, as far as liquid funds allow
    pub fn withdraw_player(&mut self, staker: &PlayerId) -> EngineResult<Amount> {
        self.ensure_open()?;
        let amount = treasury::player_payout(&self.balances, staker);
        if amount == 0 {
            return Ok(0);
        }

        self.custody.transfer_out(staker, amount)?;
        self.balances.debit_player(staker, amount);
        self.metrics.record_withdrawal();

        let remaining = self.balances.balance_of(staker);
        if remaining > 0 {
            warn!(player = %staker, paid = amount, remaining, "partial withdrawal, funds tied up in bets");
        } else {
            info!(player = %staker, amount, "player withdrawal");
        }
        self.events.emit(EngineEvent::PlayerWithdrawal {
            player: staker.clone(),
            amount,
            remaining,
        });
        Ok(amount)
    }

    /// Transfer the whole house balance to the owner if every obligation stays covered
    pub fn withdraw_owner(&mut self, caller: &PlayerId) -> EngineResult<Amount> {
        self.ensure_open()?;
        treasury::ensure_owner(&self.owner, caller)?;

        let exposure = resolution::worst_case_credit(self.bets.unresolved())?;
        let amount = match treasury::owner_payout(&self.balances, exposure) {
            Ok(amount) => amount,
            Err(e) => {
                let err = EngineError::from(e);
                warn!(
                    house = %self.balances.house(),
                    exposure = %exposure,
                    kind = ?err.kind(),
                    error = %err,
                    "owner withdrawal refused"
                );
                return Err(err);
            }
        };
        if amount == 0 {
            return Ok(0);
        }

        self.custody.transfer_out(&self.owner, amount)?;
        self.balances.take_house();
        self.metrics.record_withdrawal();

        info!(owner = %self.owner, amount, "owner withdrawal");
        self.events.emit(EngineEvent::OwnerWithdrawal {
            owner: self.owner.clone(),
            amount,
        });
        Ok(amount)
    }

    /// Owner top-up of the house balance, returning the new house balance
    pub fn fund_house(&mut self, caller: &PlayerId, amount: Amount) -> EngineResult<i128> {
        self.ensure_open()?;
        treasury::ensure_owner(&self.owner, caller)?;

        let house_balance = self.balances.fund_house(amount)?;
        info!(amount, house = %house_balance, "house funded");
        self.events.emit(EngineEvent::HouseFunded {
            amount,
            house_balance,
        });
        Ok(house_balance)
    }

    /// Tear the table down, sending everything held to the owner
    pub fn close_engine(&mut self, caller: &PlayerId) -> EngineResult<Amount> {
        self.ensure_open()?;
        treasury::ensure_owner(&self.owner, caller)?;
        treasury::ensure_closable(
            &self.balances,
            self.scheduler.phase().is_idle(),
            !self.bets.is_empty(),
        )?;

        let amount = self.balances.total_funds();
        if amount > 0 {
            self.custody.transfer_out(&self.owner, amount)?;
        }
        self.balances.drain();
        self.scheduler.close();

        info!(owner = %self.owner, amount, "engine closed");
        self.events.emit(EngineEvent::EngineClosed {
            owner: self.owner.clone(),
            amount,
        });
        Ok(amount)
    }

    pub fn balance_of(&self, player: &PlayerId) -> Amount {
        self.balances.balance_of(player)
    }

    pub fn players_total(&self) -> Amount {
        self.balances.players_total()
    }

    pub fn house_balance(&self) -> i128 {
        self.balances.house()
    }

    pub fn money_in_bank(&self) -> Amount {
        self.balances.money_in_bank()
    }

    pub fn total_funds(&self) -> Amount {
        self.balances.total_funds()
    }

    /// Bets queued for the next round
    pub fn pending_bets(&self) -> &[Bet] {
        self.bets.queued()
    }

    /// Bets of the round awaiting its outcome
    pub fn in_flight_bets(&self) -> &[Bet] {
        self.bets.in_flight()
    }

    pub fn phase(&self) -> RoundPhase {
        self.scheduler.phase()
    }

    pub fn last_winning_number(&self) -> Option<u8> {
        self.scheduler.last_winning_number()
    }

    pub fn last_resolved_at(&self) -> Timestamp {
        self.scheduler.last_resolved_at()
    }

    pub fn outstanding_request(&self) -> Option<RequestId> {
        self.scheduler.outstanding_request()
    }

    pub fn owner(&self) -> &PlayerId {
        &self.owner
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_conserved(&self) -> bool {
        self.balances.is_conserved()
    }

    pub fn events(&self) -> &[EngineEvent] {
        self.events.journal()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.scheduler.phase(),
            total_funds: self.balances.total_funds(),
            players_total: self.balances.players_total(),
            house_balance: self.balances.house(),
            money_in_bank: self.balances.money_in_bank(),
            pending_bets: self.bets.queued().to_vec(),
            in_flight_bets: self.bets.in_flight().to_vec(),
            balances: self.balances.balances(),
            last_winning_number: self.scheduler.last_winning_number(),
            last_resolved_at: self.scheduler.last_resolved_at(),
            rounds_completed: self.scheduler.rounds_completed(),
        }
    }
}
