//! Shared setup for integration tests

#![allow(dead_code)]

use roulette_engine::{
    Amount, EngineConfig, InMemoryCustody, ManualClock, PlayerId, RecordingRandomness,
    RouletteEngine,
};
use std::sync::Arc;

pub const START_TIME: u64 = 1_700_000_000;
pub const ROUND_INTERVAL: u64 = 30;

pub struct Table {
    pub engine: RouletteEngine,
    pub randomness: RecordingRandomness,
    pub clock: ManualClock,
    pub custody: InMemoryCustody,
}

pub fn table_config(bankroll: Amount) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.table.owner = "owner".to_string();
    config.table.min_stake = 1;
    config.table.max_stake = 100;
    config.table.min_round_stake = 1;
    config.table.round_interval_secs = ROUND_INTERVAL;
    config.table.initial_bankroll = bankroll;
    config
}

pub fn table(bankroll: Amount) -> Table {
    table_with(table_config(bankroll))
}

pub fn table_with(config: EngineConfig) -> Table {
    let randomness = RecordingRandomness::new();
    let clock = ManualClock::new(START_TIME);
    let custody = InMemoryCustody::new();
    let engine = RouletteEngine::new(
        config,
        Box::new(randomness.clone()),
        Arc::new(clock.clone()),
        Box::new(custody.clone()),
    )
    .expect("valid test configuration");

    Table {
        engine,
        randomness,
        clock,
        custody,
    }
}

impl Table {
    /// Advance past the round interval, start a round and deliver `random_value`
    pub fn spin(&mut self, random_value: u64) -> roulette_engine::RoundOutcome {
        self.clock.advance(ROUND_INTERVAL);
        let request_id = self.engine.start().expect("round should start");
        self.engine
            .deliver(request_id, random_value)
            .expect("delivery should resolve the round")
    }
}

pub fn player(id: &str) -> PlayerId {
    PlayerId::from(id)
}

pub fn owner() -> PlayerId {
    PlayerId::from("owner")
}
