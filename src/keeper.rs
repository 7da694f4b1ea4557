//! Round keeper: background driver for the start/deliver cycle.
//!
//! Polls the engine for readiness on an interval and starts rounds, and
//! fulfils randomness requests forwarded by [`QueuedRandomness`] with VRF
//! output. The engine stays behind one mutex so every operation is still
//! serialized.
//!
//! [`QueuedRandomness`]: crate::randomness::QueuedRandomness

use crate::engine::RouletteEngine;
use crate::errors::{EngineResult, RandomnessError};
use crate::randomness::{PendingOutcomes, VrfBundle, VrfRandomnessSource};
use crate::round::RoundOutcome;
use crate::roulette::RequestId;
use dashmap::DashMap;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::{mpsc, oneshot, Mutex};

pub struct RoundKeeper {
    engine: Arc<Mutex<RouletteEngine>>,
    source: VrfRandomnessSource,
    pending: PendingOutcomes,
    bundles: DashMap<RequestId, VrfBundle>,
    outcomes: DashMap<RequestId, RoundOutcome>,
    poll_interval: Duration,
    fulfillment_delay: Duration,
    running: Arc<AtomicBool>,
}

impl RoundKeeper {
    pub fn new(
        engine: Arc<Mutex<RouletteEngine>>,
        source: VrfRandomnessSource,
        poll_interval: Duration,
        fulfillment_delay: Duration,
    ) -> Self {
        Self {
            engine,
            source,
            pending: PendingOutcomes::new(),
            bundles: DashMap::new(),
            outcomes: DashMap::new(),
            poll_interval,
            fulfillment_delay,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Start the keeper loop on the current tokio runtime
    pub fn spawn(self, requests: mpsc::UnboundedReceiver<RequestId>) -> Arc<Self> {
        let keeper = Arc::new(self);
        keeper.clone().spawn_task(requests);
        keeper
    }

    fn spawn_task(self: Arc<Self>, mut requests: mpsc::UnboundedReceiver<RequestId>) {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(self.poll_interval.max(Duration::from_millis(1)));

            while self.running.load(Ordering::SeqCst) {
                tokio::select! {
                    biased;
                    request = requests.recv() => {
                        let Some(request_id) = request else {
                            tracing::warn!("RoundKeeper request channel closed; stopping");
                            break;
                        };
                        if !self.fulfillment_delay.is_zero() {
                            tokio::time::sleep(self.fulfillment_delay).await;
                        }
                        if let Err(e) = self.fulfil(request_id).await {
                            tracing::warn!("Failed to fulfil randomness request {}: {}", request_id, e);
                        }
                    }
                    _ = tick.tick() => {
                        if let Err(e) = self.poll_once().await {
                            tracing::warn!("RoundKeeper could not start a round: {}", e);
                        }
                    }
                }
            }

            tracing::info!("RoundKeeper stopped");
        });
    }

    /// Start a round if the engine is ready
    pub async fn poll_once(&self) -> EngineResult<Option<RequestId>> {
        let mut engine = self.engine.lock().await;
        if !engine.is_ready() {
            return Ok(None);
        }
        engine.start().map(Some)
    }

    /// Produce VRF output for the outstanding request and deliver it to the engine
    pub async fn fulfil(&self, request_id: RequestId) -> EngineResult<RoundOutcome> {
        let mut engine = self.engine.lock().await;
        if engine.outstanding_request() != Some(request_id) {
            return Err(RandomnessError::NotPending(request_id).into());
        }

        let bundle = self.source.generate(request_id)?;
        let random_value = VrfRandomnessSource::random_value(&bundle)?;

        // Recorded before delivery so observers of RoundFinished can fetch it
        self.bundles.insert(request_id, bundle);
        let outcome = match engine.deliver(request_id, random_value) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.bundles.remove(&request_id);
                return Err(e);
            }
        };
        drop(engine);

        tracing::debug!(
            request_id = %request_id,
            winning_number = outcome.winning_number,
            "randomness request fulfilled"
        );
        // Stored before waking waiters so a late wait_for still sees it
        self.outcomes.insert(request_id, outcome.clone());
        self.pending.complete(&outcome);
        Ok(outcome)
    }

    /// Receive the outcome of a round, immediately if it already resolved
    pub fn wait_for(&self, request_id: RequestId) -> oneshot::Receiver<RoundOutcome> {
        let rx = self.pending.wait_for(request_id);
        if let Some(outcome) = self.outcome(request_id) {
            self.pending.complete(&outcome);
        }
        rx
    }

    /// Wait for the outcome of a request, dropping the registration on timeout
    pub async fn wait_for_outcome(
        &self,
        request_id: RequestId,
        timeout: Duration,
    ) -> EngineResult<RoundOutcome> {
        let rx = self.wait_for(request_id);
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(RandomnessError::Cancelled(request_id).into()),
            Err(_) => {
                self.pending.cancel(request_id);
                Err(RandomnessError::Timeout {
                    request_id,
                    timeout_ms: timeout.as_millis() as u64,
                }
                .into())
            }
        }
    }

    /// Outcome of a resolved request
    pub fn outcome(&self, request_id: RequestId) -> Option<RoundOutcome> {
        self.outcomes.get(&request_id).map(|entry| entry.value().clone())
    }

    /// Number of requests with callers still waiting
    pub fn pending_waiters(&self) -> usize {
        self.pending.pending_count()
    }

    /// VRF bundle that resolved a request, for public verification
    pub fn bundle(&self, request_id: RequestId) -> Option<VrfBundle> {
        self.bundles.get(&request_id).map(|entry| entry.value().clone())
    }

    pub fn public_key_hex(&self) -> String {
        self.source.public_key_hex()
    }

    pub fn engine(&self) -> Arc<Mutex<RouletteEngine>> {
        self.engine.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Start and resolve one round inline when the engine is ready, for tables run
/// without a background keeper. The engine must use a provider that does not
/// expect its own fulfiller.
pub fn run_round(
    engine: &mut RouletteEngine,
    source: &VrfRandomnessSource,
) -> EngineResult<Option<(RoundOutcome, VrfBundle)>> {
    if !engine.is_ready() {
        return Ok(None);
    }
    let request_id = engine.start()?;
    let bundle = source.generate(request_id)?;
    let random_value = VrfRandomnessSource::random_value(&bundle)?;
    let outcome = engine.deliver(request_id, random_value)?;
    Ok(Some((outcome, bundle)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::EngineConfig;
    use crate::errors::EngineError;
    use crate::randomness::{QueuedRandomness, RecordingRandomness};
    use crate::roulette::{BetCategory, PlayerId};
    use crate::treasury::InMemoryCustody;

    fn keeper() -> (RoundKeeper, mpsc::UnboundedReceiver<RequestId>, ManualClock) {
        let mut config = EngineConfig::development();
        config.table.round_interval_secs = 10;

        let clock = ManualClock::new(0);
        let (provider, requests) = QueuedRandomness::channel();
        let engine = RouletteEngine::new(
            config,
            Box::new(provider),
            Arc::new(clock.clone()),
            Box::new(InMemoryCustody::new()),
        )
        .unwrap();

        let keeper = RoundKeeper::new(
            Arc::new(Mutex::new(engine)),
            VrfRandomnessSource::new_random("roulette"),
            Duration::from_millis(10),
            Duration::ZERO,
        );
        (keeper, requests, clock)
    }

    #[tokio::test]
    async fn test_poll_waits_for_interval() {
        let (keeper, mut requests, clock) = keeper();
        {
            let mut engine = keeper.engine.lock().await;
            engine
                .create_bet(&PlayerId::from("alice"), BetCategory::Single, &[17], 5)
                .unwrap();
        }

        assert_eq!(keeper.poll_once().await.unwrap(), None);
        clock.advance(10);
        assert_eq!(keeper.poll_once().await.unwrap(), Some(RequestId(1)));
        assert_eq!(requests.recv().await, Some(RequestId(1)));
        assert_eq!(keeper.poll_once().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fulfil_resolves_and_notifies() {
        let (keeper, _requests, clock) = keeper();
        {
            let mut engine = keeper.engine.lock().await;
            engine
                .create_bet(&PlayerId::from("alice"), BetCategory::Single, &[17], 5)
                .unwrap();
        }
        clock.advance(10);
        let request_id = keeper.poll_once().await.unwrap().unwrap();
        let waiter = keeper.wait_for(request_id);

        let outcome = keeper.fulfil(request_id).await.unwrap();
        assert_eq!(waiter.await.unwrap(), outcome);

        let bundle = keeper.bundle(request_id).unwrap();
        assert!(VrfRandomnessSource::verify(&bundle, "roulette:spin:1").unwrap());
        assert_eq!(
            VrfRandomnessSource::random_value(&bundle).unwrap(),
            outcome.random_value
        );
        assert!(matches!(
            keeper.fulfil(request_id).await,
            Err(EngineError::Randomness(RandomnessError::NotPending(id))) if id == request_id
        ));
        assert!(keeper.engine.lock().await.phase().is_idle());
    }

    #[tokio::test]
    async fn test_wait_after_resolution_completes_immediately() {
        let (keeper, _requests, clock) = keeper();
        {
            let mut engine = keeper.engine.lock().await;
            engine
                .create_bet(&PlayerId::from("alice"), BetCategory::Single, &[17], 5)
                .unwrap();
        }
        clock.advance(10);
        let request_id = keeper.poll_once().await.unwrap().unwrap();
        let outcome = keeper.fulfil(request_id).await.unwrap();

        let late = keeper
            .wait_for_outcome(request_id, Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(late, outcome);
        assert_eq!(keeper.outcome(request_id), Some(outcome));
        assert_eq!(keeper.pending_waiters(), 0);
    }

    #[tokio::test]
    async fn test_wait_timeout_drops_registration() {
        let (keeper, _requests, _clock) = keeper();
        let err = keeper
            .wait_for_outcome(RequestId(9), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Randomness(RandomnessError::Timeout {
                request_id: RequestId(9),
                timeout_ms: 20,
            })
        );
        assert_eq!(keeper.pending_waiters(), 0);
    }

    #[test]
    fn test_run_round_inline() {
        let mut config = EngineConfig::development();
        config.table.round_interval_secs = 10;
        let clock = ManualClock::new(0);
        let randomness = RecordingRandomness::new();
        let mut engine = RouletteEngine::new(
            config,
            Box::new(randomness.clone()),
            Arc::new(clock.clone()),
            Box::new(InMemoryCustody::new()),
        )
        .unwrap();
        let source = VrfRandomnessSource::new_random("roulette");

        engine
            .create_bet(&PlayerId::from("alice"), BetCategory::Single, &[17], 5)
            .unwrap();
        assert!(run_round(&mut engine, &source).unwrap().is_none());

        clock.advance(10);
        let (outcome, bundle) = run_round(&mut engine, &source).unwrap().unwrap();
        assert_eq!(randomness.requests(), vec![RequestId(1)]);
        assert!(VrfRandomnessSource::verify(&bundle, "roulette:spin:1").unwrap());
        assert_eq!(outcome.random_value, VrfRandomnessSource::random_value(&bundle).unwrap());
        assert!(engine.phase().is_idle());
        assert!(engine.pending_bets().is_empty());
        assert!(engine.is_conserved());
    }

    #[tokio::test]
    async fn test_fulfil_rejects_unqueued_request() {
        let (keeper, _requests, _clock) = keeper();
        assert_eq!(
            keeper.fulfil(RequestId(3)).await,
            Err(EngineError::Randomness(RandomnessError::NotPending(RequestId(3))))
        );
        assert!(keeper.bundle(RequestId(3)).is_none());
    }
}
