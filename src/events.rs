//! Engine notifications
//!
//! Every state transition appends to an ordered journal and is published on a
//! broadcast channel for live subscribers.

use crate::roulette::{Amount, Bet, PlayerId, RequestId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    BetCreated {
        bet: Bet,
    },
    RoundStarted {
        round_id: u64,
        request_id: RequestId,
        bet_count: usize,
        total_stake: Amount,
    },
    RandomnessRequested {
        request_id: RequestId,
    },
    RoundFinished {
        round_id: u64,
        request_id: RequestId,
        winning_number: u8,
        bets_resolved: usize,
        total_credited: Amount,
    },
    BalanceDeposited {
        player: PlayerId,
        amount: Amount,
        balance: Amount,
    },
    PlayerWithdrawal {
        player: PlayerId,
        amount: Amount,
        remaining: Amount,
    },
    OwnerWithdrawal {
        owner: PlayerId,
        amount: Amount,
    },
    HouseFunded {
        amount: Amount,
        house_balance: i128,
    },
    EngineClosed {
        owner: PlayerId,
        amount: Amount,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::BetCreated { .. } => "bet_created",
            EngineEvent::RoundStarted { .. } => "round_started",
            EngineEvent::RandomnessRequested { .. } => "randomness_requested",
            EngineEvent::RoundFinished { .. } => "round_finished",
            EngineEvent::BalanceDeposited { .. } => "balance_deposited",
            EngineEvent::PlayerWithdrawal { .. } => "player_withdrawal",
            EngineEvent::OwnerWithdrawal { .. } => "owner_withdrawal",
            EngineEvent::HouseFunded { .. } => "house_funded",
            EngineEvent::EngineClosed { .. } => "engine_closed",
        }
    }
}

/// Ordered journal plus live broadcast
#[derive(Debug)]
pub struct EventLog {
    journal: Vec<EngineEvent>,
    publisher: broadcast::Sender<EngineEvent>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let (publisher, _) = broadcast::channel(capacity.max(1));
        Self {
            journal: Vec::new(),
            publisher,
        }
    }

    pub fn emit(&mut self, event: EngineEvent) {
        tracing::debug!(event = event.name(), "engine event");
        // No subscribers is fine; the journal keeps the event.
        let _ = self.publisher.send(event.clone());
        self.journal.push(event);
    }

    pub fn journal(&self) -> &[EngineEvent] {
        &self.journal
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.publisher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_are_journaled_and_broadcast() {
        let mut log = EventLog::new(16);
        let mut rx = log.subscribe();

        log.emit(EngineEvent::RandomnessRequested { request_id: RequestId(1) });
        log.emit(EngineEvent::HouseFunded { amount: 5, house_balance: 5 });

        assert_eq!(log.journal().len(), 2);
        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::RandomnessRequested { request_id: RequestId(1) }
        );
        assert_eq!(rx.recv().await.unwrap().name(), "house_funded");
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = EngineEvent::OwnerWithdrawal {
            owner: PlayerId::from("owner"),
            amount: 9,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"owner_withdrawal\""));
        assert!(json.contains("\"owner\":\"owner\""));
    }
}
