//! Engine counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    bets_accepted: AtomicU64,
    bets_rejected: AtomicU64,
    rounds_started: AtomicU64,
    rounds_finished: AtomicU64,
    volume_staked: AtomicU64,
    total_credited: AtomicU64,
    withdrawals: AtomicU64,
}

/// Shared handle to the engine counters. Clones observe the same values.
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
    counters: Arc<Counters>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub bets_accepted: u64,
    pub bets_rejected: u64,
    pub rounds_started: u64,
    pub rounds_finished: u64,
    pub volume_staked: u64,
    pub total_credited: u64,
    pub withdrawals: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bet(&self, stake: u64) {
        self.counters.bets_accepted.fetch_add(1, Ordering::Relaxed);
        self.counters.volume_staked.fetch_add(stake, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.counters.bets_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round_started(&self) {
        self.counters.rounds_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round_finished(&self, credited: u64) {
        self.counters.rounds_finished.fetch_add(1, Ordering::Relaxed);
        self.counters.total_credited.fetch_add(credited, Ordering::Relaxed);
    }

    pub fn record_withdrawal(&self) {
        self.counters.withdrawals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.counters;
        MetricsSnapshot {
            bets_accepted: c.bets_accepted.load(Ordering::Relaxed),
            bets_rejected: c.bets_rejected.load(Ordering::Relaxed),
            rounds_started: c.rounds_started.load(Ordering::Relaxed),
            rounds_finished: c.rounds_finished.load(Ordering::Relaxed),
            volume_staked: c.volume_staked.load(Ordering::Relaxed),
            total_credited: c.total_credited.load(Ordering::Relaxed),
            withdrawals: c.withdrawals.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_shared_between_clones() {
        let metrics = EngineMetrics::new();
        let handle = metrics.clone();
        metrics.record_bet(10);
        metrics.record_bet(5);
        handle.record_rejection();
        handle.record_round_finished(36);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.bets_accepted, 2);
        assert_eq!(snapshot.volume_staked, 15);
        assert_eq!(snapshot.bets_rejected, 1);
        assert_eq!(snapshot.total_credited, 36);
        assert_eq!(snapshot.rounds_started, 0);
    }
}
