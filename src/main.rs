//! Roulette Engine CLI
//!
//! Runs simulated tables, driven by the round keeper or inline when the keeper
//! is disabled, and writes sample configs.

use clap::{Parser, Subcommand};
use rand::Rng;
use roulette_engine::{
    config::{generate_sample_config, ConfigLoader, EngineConfig},
    keeper::run_round,
    randomness::VrfRandomnessSource,
    roulette::board::{row_members, MAX_NUMBER},
    BetCategory, EngineEvent, InMemoryCustody, ManualClock, PlayerId, QueuedRandomness,
    RandomnessProvider, RecordingRandomness, RoundKeeper, RouletteEngine,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::Mutex;

/// Roulette engine CLI
#[derive(Parser)]
#[command(name = "roulette-engine")]
#[command(about = "Single-zero roulette wagering and settlement engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play simulated rounds with random players and print the final state
    Simulate {
        /// Rounds to play
        #[arg(short, long, default_value = "10")]
        rounds: u64,

        /// Number of simulated players
        #[arg(short, long, default_value = "4")]
        players: usize,

        /// Bets per player per round
        #[arg(short, long, default_value = "3")]
        bets_per_player: usize,

        /// Seconds to wait for a round to resolve
        #[arg(long, default_value = "5")]
        round_timeout_secs: u64,
    },

    /// Write a configuration file
    SampleConfig {
        /// Output path
        #[arg(short, long, default_value = "roulette.toml")]
        output: PathBuf,

        /// Preset: default, development or production
        #[arg(long, default_value = "default")]
        preset: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }

    match cli.command {
        Commands::SampleConfig { output, preset } => {
            let config = match preset.as_str() {
                "default" => EngineConfig::default(),
                "development" => EngineConfig::development(),
                "production" => EngineConfig::production(),
                other => return Err(format!("unknown preset '{}'", other).into()),
            };
            generate_sample_config(&output.to_string_lossy(), &config)?;
            println!("Wrote {} configuration to {}", preset, output.display());
            Ok(())
        }
        Commands::Simulate {
            rounds,
            players,
            bets_per_player,
            round_timeout_secs,
        } => {
            let config = if cli.config.is_some() {
                loader.load()?
            } else {
                EngineConfig::development()
            };
            init_tracing(&config, cli.verbose);
            simulate(
                config,
                rounds,
                players.max(1),
                bets_per_player.max(1),
                Duration::from_secs(round_timeout_secs),
            )
            .await
        }
    }
}

fn init_tracing(config: &EngineConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.monitoring.log_level.as_filter()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("roulette_engine={}", level).into()),
        )
        .init();
}

/// How rounds get started and resolved during a simulation
enum RoundDriver {
    Keeper(Arc<RoundKeeper>),
    Inline(VrfRandomnessSource),
}

/// A structurally valid random bet
fn random_bet<R: Rng>(rng: &mut R) -> (BetCategory, Vec<u8>) {
    let code = rng.gen_range(0..10u8);
    let category = BetCategory::from_code(code).unwrap_or(BetCategory::Single);
    let numbers = match code {
        0 => vec![rng.gen_range(0..=MAX_NUMBER)],
        1 => {
            let n = rng.gen_range(1..=33u8);
            vec![n, n + 3]
        }
        2 => row_members(rng.gen_range(0..12u8)).to_vec(),
        3 => {
            let n = 3 * rng.gen_range(0..11u8) + 1 + rng.gen_range(0..2u8);
            vec![n, n + 1, n + 3, n + 4]
        }
        4 => {
            let first = 3 * rng.gen_range(0..=10u8) + 1;
            (first..first + 6).collect()
        }
        5 | 6 => vec![rng.gen_range(0..3u8)],
        _ => vec![rng.gen_range(0..2u8)],
    };
    (category, numbers)
}

async fn simulate(
    config: EngineConfig,
    rounds: u64,
    players: usize,
    bets_per_player: usize,
    round_timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = match &config.randomness.secret_key_hex {
        Some(secret) => VrfRandomnessSource::from_secret_hex(secret, config.randomness.vrf_domain.clone())?,
        None => VrfRandomnessSource::new_random(config.randomness.vrf_domain.clone()),
    };
    let keeper_enabled = config.keeper.enabled;
    let poll_interval = config.poll_interval();
    let fulfillment_delay = config.fulfillment_delay();
    let round_interval = config.table.round_interval_secs;
    let min_stake = config.table.min_stake;
    let max_stake = config
        .table
        .max_stake
        .min(min_stake.saturating_mul(100).max(config.table.min_round_stake));

    // Simulated time lets rounds run back to back regardless of the interval
    let clock = ManualClock::new(0);
    let custody = InMemoryCustody::new();
    let (provider, requests) = if keeper_enabled {
        let (provider, requests) = QueuedRandomness::channel();
        (Box::new(provider) as Box<dyn RandomnessProvider>, Some(requests))
    } else {
        (Box::new(RecordingRandomness::new()) as Box<dyn RandomnessProvider>, None)
    };
    let engine = RouletteEngine::new(config, provider, Arc::new(clock.clone()), Box::new(custody.clone()))?;
    let mut events = engine.subscribe();
    let engine = Arc::new(Mutex::new(engine));

    tracing::info!(public_key = %source.public_key_hex(), keeper_enabled, "vrf source ready");
    let driver = match requests {
        Some(requests) => RoundDriver::Keeper(
            RoundKeeper::new(engine.clone(), source, poll_interval, fulfillment_delay).spawn(requests),
        ),
        None => RoundDriver::Inline(source),
    };

    let mut rng = rand::thread_rng();
    let player_ids: Vec<PlayerId> = (1..=players)
        .map(|i| PlayerId::new(format!("player-{}", i)))
        .collect();

    for _ in 0..rounds {
        {
            let mut engine = engine.lock().await;
            for player in &player_ids {
                for _ in 0..bets_per_player {
                    let (category, numbers) = random_bet(&mut rng);
                    let stake = rng.gen_range(min_stake..=max_stake);
                    engine.create_bet(player, category, &numbers, stake)?;
                }
            }
        }
        clock.advance(round_interval);
        if let RoundDriver::Inline(source) = &driver {
            run_round(&mut *engine.lock().await, source)?;
        }

        let finished = tokio::time::timeout(round_timeout, async {
            loop {
                match events.recv().await {
                    Ok(EngineEvent::RoundFinished { winning_number, .. }) => break Ok(winning_number),
                    Ok(_) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(e) => break Err(e),
                }
            }
        })
        .await;

        match finished {
            Ok(Ok(winning_number)) => println!("Round finished: winning number {}", winning_number),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err("timed out waiting for the round to resolve".into()),
        }
    }

    if let RoundDriver::Keeper(keeper) = &driver {
        keeper.stop();
    }

    let mut engine = engine.lock().await;
    for player in &player_ids {
        engine.withdraw_player(player)?;
    }
    let owner = engine.owner().clone();
    let withdrawn = engine.withdraw_owner(&owner);
    tracing::info!(?withdrawn, "owner withdrawal after simulation");

    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    println!("{}", serde_json::to_string_pretty(&engine.metrics())?);
    println!("Transfers out: {}", custody.transfers().len());
    Ok(())
}
