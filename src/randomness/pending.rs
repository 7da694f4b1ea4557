use crate::round::RoundOutcome;
use crate::roulette::RequestId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Thread-safe pool of callers waiting for a round's outcome
#[derive(Clone, Default)]
pub struct PendingOutcomes {
    /// Map of request id -> waiting senders
    pending: Arc<DashMap<RequestId, Vec<oneshot::Sender<RoundOutcome>>>>,
}

impl PendingOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the outcome of `request_id`
    pub fn wait_for(&self, request_id: RequestId) -> oneshot::Receiver<RoundOutcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.entry(request_id).or_default().push(tx);
        rx
    }

    /// Send the outcome to every waiter, returning how many were registered
    pub fn complete(&self, outcome: &RoundOutcome) -> usize {
        match self.pending.remove(&outcome.request_id) {
            Some((_, senders)) => {
                let count = senders.len();
                for sender in senders {
                    // Receiver may have been dropped
                    let _ = sender.send(outcome.clone());
                }
                count
            }
            None => 0,
        }
    }

    /// Drop the waiters of a request (their receivers observe cancellation)
    pub fn cancel(&self, request_id: RequestId) -> bool {
        self.pending.remove(&request_id).is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, request_id: RequestId) -> bool {
        self.pending.contains_key(&request_id)
    }
}
