//! End-to-end fleet test: two in-memory-meshed ranks solving a small game
//! that splits across both of them, proving cross-rank
//! LOOK_UP/DISTRIBUTE/RESOLVE round trips actually work.

use engine::{GameRules, Outcome, Worker};
use transport::mem::build_fleet;

#[derive(Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
struct Count(u8);

struct CountingGame;

impl GameRules for CountingGame {
    type Position = Count;

    fn initial_position(&self) -> Count {
        Count(0)
    }

    fn is_primitive(&self, position: &Count) -> bool {
        position.0 >= 4
    }

    fn primitive_value(&self, _position: &Count) -> Outcome {
        Outcome::Loss
    }

    fn successors(&self, position: &Count) -> Vec<Count> {
        vec![Count(position.0 + 1)]
    }
}

#[test]
fn two_rank_fleet_agrees_with_a_single_rank_solve() {
    let fleet = build_fleet::<Count>(2);
    let handles: Vec<_> = fleet
        .into_iter()
        .map(|transport| {
            std::thread::spawn(move || {
                let mut worker = Worker::new(CountingGame, transport);
                worker.run().expect("fleet aborts only on a fatal bug")
            })
        })
        .collect();

    let reported: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .flatten()
        .collect();

    // Exactly one rank owns the initial position and reports the final
    // value; every other rank just observes FINISHED and returns None.
    assert_eq!(reported.len(), 1);
    // 0 -> 1 -> 2 -> 3 -> 4 (LOSS, primitive), negated four times back up
    // to 0: WIN, remoteness 4.
    assert_eq!(reported[0], (Outcome::Win, 4));
}
