//! Conservation over long random operation sequences

mod common;

use common::{owner, player, table, ROUND_INTERVAL};
use rand::{rngs::StdRng, Rng, SeedableRng};
use roulette_engine::{BetCategory, EvenMoneyGroup, PlayerId};

fn random_bet(rng: &mut StdRng) -> (BetCategory, Vec<u8>) {
    match rng.gen_range(0..6) {
        0 => (BetCategory::Single, vec![rng.gen_range(0..37)]),
        1 => {
            let n = rng.gen_range(1..=33u8);
            (BetCategory::Split, vec![n, n + 3])
        }
        2 => (BetCategory::Dozen, vec![rng.gen_range(0..3)]),
        3 => (BetCategory::Column, vec![rng.gen_range(0..3)]),
        4 => (BetCategory::EvenMoney(EvenMoneyGroup::Color), vec![rng.gen_range(0..2)]),
        // Deliberately malformed some of the time
        _ => (BetCategory::Street, vec![rng.gen_range(0..37), 5, 6]),
    }
}

#[test]
fn test_conservation_holds_after_every_operation() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut t = table(500);
    let players: Vec<PlayerId> = (0..5).map(|i| player(&format!("p{}", i))).collect();

    for _ in 0..2_000 {
        let who = &players[rng.gen_range(0..players.len())];
        match rng.gen_range(0..10) {
            0..=3 => {
                let (category, numbers) = random_bet(&mut rng);
                let stake = rng.gen_range(0..=120);
                let _ = t.engine.create_bet(who, category, &numbers, stake);
            }
            4 => {
                let (category, numbers) = random_bet(&mut rng);
                let stake = rng.gen_range(1..=50);
                let _ = t.engine.create_bet_from_balance(who, category, &numbers, stake);
            }
            5 => {
                let _ = t.engine.deposit_to_balance(who, rng.gen_range(0..100));
            }
            6 => {
                t.clock.advance(rng.gen_range(0..=ROUND_INTERVAL));
                if t.engine.is_ready() {
                    t.engine.start().unwrap();
                }
            }
            7 => {
                if let Some(id) = t.engine.outstanding_request() {
                    let _ = t.engine.deliver(id, rng.gen());
                }
            }
            8 => {
                let _ = t.engine.withdraw_player(who);
            }
            _ => {
                if rng.gen_bool(0.5) {
                    let _ = t.engine.withdraw_owner(&owner());
                } else {
                    let _ = t.engine.fund_house(&owner(), rng.gen_range(0..200));
                }
            }
        }

        assert!(t.engine.is_conserved(), "{:?}", t.engine.snapshot());
        let unresolved = t.engine.pending_bets().len() + t.engine.in_flight_bets().len();
        assert_eq!(t.engine.money_in_bank() == 0, unresolved == 0);
        let sum: u64 = t.engine.snapshot().balances.iter().map(|(_, b)| b).sum();
        assert_eq!(sum, t.engine.players_total());
    }
}
