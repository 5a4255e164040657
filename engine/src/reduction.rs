//! The reduction kernel (§4.7): folds child-perspective `(outcome,
//! remoteness)` results into the parent's value.

use protocol::{Outcome, Remoteness};

/// Picks whichever of two child-perspective outcomes has higher preference
/// (`LOSS > TIE > DRAW > WIN`). Commutative and associative, so folding a
/// list of outcomes with this doesn't depend on arrival order.
fn combine_outcome(a: Outcome, b: Outcome) -> Outcome {
    if a.preference() >= b.preference() { a } else { b }
}

/// Folds two child-perspective `(outcome, remoteness)` pairs, deciding which
/// branch to take from the pair of outcomes seen so far. Only the
/// remoteness half of a full fold's result is meaningful; the parent's
/// outcome is always taken from [`reduce_outcome`] instead, folded
/// independently over the same children.
fn combine_remoteness(
    a: (Outcome, Remoteness),
    b: (Outcome, Remoteness),
) -> (Outcome, Remoteness) {
    match (a.0, b.0) {
        (Outcome::Loss, Outcome::Win) => (Outcome::Loss, a.1),
        (Outcome::Win, Outcome::Loss) => (Outcome::Loss, b.1),
        (Outcome::Loss, _) | (_, Outcome::Loss) => (Outcome::Loss, a.1.min(b.1)),
        (Outcome::Win, Outcome::Win) => (Outcome::Win, a.1.max(b.1)),
        _ => (a.0, a.1.max(b.1)),
    }
}

/// Reduces a non-empty list of child-perspective outcomes into the parent's
/// outcome, already negated into the parent's perspective.
pub fn reduce_outcome(children: &[Outcome]) -> Outcome {
    let mut iter = children.iter().copied();
    let first = iter
        .next()
        .expect("reduce_outcome requires a non-empty child list");
    iter.fold(first, combine_outcome).negate()
}

/// Reduces a non-empty list of child-perspective `(outcome, remoteness)`
/// pairs into the parent's remoteness: one ply further out than whichever
/// child decided the reduction.
pub fn reduce_remoteness(children: &[(Outcome, Remoteness)]) -> Remoteness {
    let mut iter = children.iter().copied();
    let first = iter
        .next()
        .expect("reduce_remoteness requires a non-empty child list");
    iter.fold(first, combine_remoteness).1 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_single_loss_child_wins_the_parent_fastest() {
        let children = [Outcome::Loss, Outcome::Win, Outcome::Win];
        assert_eq!(reduce_outcome(&children), Outcome::Win);
    }

    #[test]
    fn all_win_children_force_a_loss() {
        let children = [Outcome::Win, Outcome::Win];
        assert_eq!(reduce_outcome(&children), Outcome::Loss);
    }

    #[test]
    fn a_tie_beats_a_draw_for_the_child() {
        let children = [Outcome::Win, Outcome::Tie, Outcome::Draw];
        // best-for-child is TIE (highest preference among non-LOSS), so the
        // parent, negated, still sees TIE (TIE negates to itself).
        assert_eq!(reduce_outcome(&children), Outcome::Tie);
    }

    #[test]
    fn remoteness_prefers_the_fastest_loss() {
        let children = [
            (Outcome::Loss, 5),
            (Outcome::Win, 2),
            (Outcome::Loss, 1),
        ];
        assert_eq!(reduce_remoteness(&children), 2);
    }

    #[test]
    fn remoteness_delays_a_forced_loss() {
        let children = [(Outcome::Win, 3), (Outcome::Win, 7)];
        assert_eq!(reduce_remoteness(&children), 8);
    }

    #[test]
    fn primitive_remoteness_plus_one_ply() {
        let children = [(Outcome::Win, 0)];
        assert_eq!(reduce_remoteness(&children), 1);
    }
}
