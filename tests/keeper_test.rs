//! Keeper-driven rounds on a live tokio runtime

use roulette_engine::{
    randomness::VrfRandomnessSource, BetCategory, EngineConfig, EngineEvent, InMemoryCustody,
    ManualClock, PlayerId, QueuedRandomness, RoundKeeper, RouletteEngine,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, Mutex};

async fn next_round_finished(events: &mut broadcast::Receiver<EngineEvent>) -> u8 {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let EngineEvent::RoundFinished { winning_number, .. } =
                events.recv().await.expect("event stream open")
            {
                return winning_number;
            }
        }
    })
    .await
    .expect("round should finish")
}

#[tokio::test]
async fn test_keeper_runs_rounds_until_stopped() {
    let mut config = EngineConfig::development();
    config.table.round_interval_secs = 30;

    let clock = ManualClock::new(0);
    let (provider, requests) = QueuedRandomness::channel();
    let engine = RouletteEngine::new(
        config,
        Box::new(provider),
        Arc::new(clock.clone()),
        Box::new(InMemoryCustody::new()),
    )
    .unwrap();
    let mut events = engine.subscribe();
    let engine = Arc::new(Mutex::new(engine));

    let keeper = RoundKeeper::new(
        engine.clone(),
        VrfRandomnessSource::new_random("roulette"),
        Duration::from_millis(5),
        Duration::ZERO,
    )
    .spawn(requests);

    let alice = PlayerId::from("alice");
    for round in 1..=3u64 {
        engine
            .lock()
            .await
            .create_bet(&alice, BetCategory::Dozen, &[1], 10)
            .unwrap();
        clock.advance(30);

        let winning_number = next_round_finished(&mut events).await;
        let bundle = keeper
            .bundle(roulette_engine::RequestId(round))
            .expect("bundle recorded for the request");
        let expected = format!("roulette:spin:{}", round);
        assert!(VrfRandomnessSource::verify(&bundle, &expected).unwrap());
        assert_eq!(
            (VrfRandomnessSource::random_value(&bundle).unwrap() % 37) as u8,
            winning_number
        );
    }

    keeper.stop();
    let engine = engine.lock().await;
    assert_eq!(engine.snapshot().rounds_completed, 3);
    assert!(engine.phase().is_idle());
    assert!(engine.is_conserved());
    assert_eq!(engine.metrics().rounds_finished, 3);
}
