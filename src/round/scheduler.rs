//! Round scheduler
//!
//! Two-state machine over [`RoundPhase`]: `Idle` until a round is started, then
//! `AwaitingOutcome` until the matching randomness arrives. Only one request is
//! ever outstanding.

use crate::errors::RoundError;
use crate::roulette::{Amount, RequestId, RoundPhase, Timestamp};

#[derive(Debug, Clone)]
pub struct RoundScheduler {
    phase: RoundPhase,
    next_request_id: u64,
    rounds_started: u64,
    rounds_completed: u64,
    last_resolved_at: Timestamp,
    last_winning_number: Option<u8>,
    round_interval_secs: u64,
    min_round_stake: Amount,
}

impl RoundScheduler {
    pub fn new(round_interval_secs: u64, min_round_stake: Amount, now: Timestamp) -> Self {
        Self {
            phase: RoundPhase::Idle,
            next_request_id: 1,
            rounds_started: 0,
            rounds_completed: 0,
            last_resolved_at: now,
            last_winning_number: None,
            round_interval_secs,
            min_round_stake,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn outstanding_request(&self) -> Option<RequestId> {
        self.phase.outstanding_request()
    }

    pub fn last_resolved_at(&self) -> Timestamp {
        self.last_resolved_at
    }

    pub fn last_winning_number(&self) -> Option<u8> {
        self.last_winning_number
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    /// Round interval has elapsed since the last resolution
    pub fn is_due(&self, now: Timestamp) -> bool {
        now.saturating_sub(self.last_resolved_at) >= self.round_interval_secs
    }

    pub fn is_ready(&self, now: Timestamp, has_queued: bool, money_in_bank: Amount) -> bool {
        self.phase.is_idle()
            && has_queued
            && money_in_bank >= self.min_round_stake
            && self.is_due(now)
    }

    /// Identifiers the next round will use, or why it cannot start
    pub fn prepare(
        &self,
        now: Timestamp,
        has_queued: bool,
        money_in_bank: Amount,
    ) -> Result<(u64, RequestId), RoundError> {
        if let RoundPhase::AwaitingOutcome { request_id, .. } = self.phase {
            return Err(RoundError::RoundAlreadyInFlight { request_id });
        }
        if !self.is_ready(now, has_queued, money_in_bank) {
            return Err(RoundError::NotReady);
        }
        Ok((self.rounds_started + 1, RequestId(self.next_request_id)))
    }

    /// Enter `AwaitingOutcome` with ids obtained from [`prepare`](Self::prepare)
    pub fn begin(&mut self, round_id: u64, request_id: RequestId) {
        self.rounds_started = round_id;
        self.next_request_id = request_id.0 + 1;
        self.phase = RoundPhase::AwaitingOutcome { round_id, request_id };
    }

    /// Round id for a delivered request, if it is the outstanding one
    pub fn accept(&self, request_id: RequestId) -> Result<u64, RoundError> {
        match self.phase {
            RoundPhase::AwaitingOutcome {
                round_id,
                request_id: outstanding,
            } if outstanding == request_id => Ok(round_id),
            _ => Err(RoundError::UnknownRequest { request_id }),
        }
    }

    pub fn finish(&mut self, now: Timestamp, winning_number: u8) {
        self.phase = RoundPhase::Idle;
        self.rounds_completed += 1;
        self.last_resolved_at = now;
        self.last_winning_number = Some(winning_number);
    }

    pub fn close(&mut self) {
        self.phase = RoundPhase::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> RoundScheduler {
        RoundScheduler::new(30, 10, 1_000)
    }

    #[test]
    fn test_readiness_conditions() {
        let s = scheduler();
        assert!(!s.is_ready(1_029, true, 10));
        assert!(s.is_ready(1_030, true, 10));
        assert!(!s.is_ready(1_030, false, 10));
        assert!(!s.is_ready(1_030, true, 9));
    }

    #[test]
    fn test_first_request_id_is_one() {
        let mut s = scheduler();
        let (round_id, request_id) = s.prepare(1_030, true, 10).unwrap();
        assert_eq!((round_id, request_id), (1, RequestId(1)));

        s.begin(round_id, request_id);
        assert_eq!(s.outstanding_request(), Some(RequestId(1)));
        assert_eq!(
            s.prepare(1_030, true, 10),
            Err(RoundError::RoundAlreadyInFlight { request_id: RequestId(1) })
        );
    }

    #[test]
    fn test_accept_rejects_stale_and_forged_ids() {
        let mut s = scheduler();
        assert_eq!(
            s.accept(RequestId(1)),
            Err(RoundError::UnknownRequest { request_id: RequestId(1) })
        );

        let (round_id, request_id) = s.prepare(1_030, true, 10).unwrap();
        s.begin(round_id, request_id);
        assert!(s.accept(RequestId(2)).is_err());
        assert_eq!(s.accept(RequestId(1)), Ok(1));

        s.finish(1_040, 28);
        assert!(s.phase().is_idle());
        assert_eq!(s.last_winning_number(), Some(28));
        assert_eq!(s.last_resolved_at(), 1_040);
        assert!(s.accept(RequestId(1)).is_err());

        let (round_id, request_id) = s.prepare(1_070, true, 10).unwrap();
        assert_eq!((round_id, request_id), (2, RequestId(2)));
    }

    #[test]
    fn test_closed_is_never_ready() {
        let mut s = scheduler();
        s.close();
        assert!(!s.is_ready(2_000, true, 100));
        assert_eq!(s.prepare(2_000, true, 100), Err(RoundError::NotReady));
    }
}
