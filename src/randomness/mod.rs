//! Randomness collaborators
//!
//! The engine only asks for "one unpredictable value tied to this request id"
//! and later receives it through `deliver`. How the value is produced lives
//! behind [`RandomnessProvider`].

pub mod pending;
pub mod vrf;

pub use pending::PendingOutcomes;
pub use vrf::{VrfBundle, VrfRandomnessSource};

use crate::errors::RandomnessError;
use crate::roulette::RequestId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub trait RandomnessProvider: Send {
    /// Ask for one random value correlated with `request_id`. Must not block.
    fn request_random_value(&mut self, request_id: RequestId) -> Result<(), RandomnessError>;
}

/// Provider that records requests for the caller to fulfil by hand. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingRandomness {
    requests: Arc<Mutex<Vec<RequestId>>>,
    reject: Arc<AtomicBool>,
}

impl RecordingRandomness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rejecting(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RequestId> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_request(&self) -> Option<RequestId> {
        self.requests().last().copied()
    }
}

impl RandomnessProvider for RecordingRandomness {
    fn request_random_value(&mut self, request_id: RequestId) -> Result<(), RandomnessError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(RandomnessError::RequestRejected(
                request_id,
                "provider is rejecting requests".to_string(),
            ));
        }
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request_id);
        Ok(())
    }
}

/// Provider that forwards request ids to an async fulfiller over a channel
#[derive(Debug, Clone)]
pub struct QueuedRandomness {
    sender: mpsc::UnboundedSender<RequestId>,
}

impl QueuedRandomness {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RequestId>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl RandomnessProvider for QueuedRandomness {
    fn request_random_value(&mut self, request_id: RequestId) -> Result<(), RandomnessError> {
        self.sender.send(request_id).map_err(|_| {
            RandomnessError::RequestRejected(request_id, "fulfiller has shut down".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_provider() {
        let mut provider = RecordingRandomness::new();
        let observer = provider.clone();
        provider.request_random_value(RequestId(1)).unwrap();
        assert_eq!(observer.last_request(), Some(RequestId(1)));

        observer.set_rejecting(true);
        assert!(matches!(
            provider.request_random_value(RequestId(2)),
            Err(RandomnessError::RequestRejected(RequestId(2), _))
        ));
        assert_eq!(observer.requests(), vec![RequestId(1)]);
    }

    #[tokio::test]
    async fn test_queued_provider_forwards_and_fails_when_closed() {
        let (mut provider, mut rx) = QueuedRandomness::channel();
        provider.request_random_value(RequestId(4)).unwrap();
        assert_eq!(rx.recv().await, Some(RequestId(4)));

        drop(rx);
        assert!(provider.request_random_value(RequestId(5)).is_err());
    }
}
