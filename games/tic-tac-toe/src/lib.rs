//! Tic-tac-toe as a `GameRules` implementation: a 3x3 board, win-checking
//! along rows, columns and both diagonals, and full-board detection for a
//! cat's game.

use engine::{GameRules, Outcome};
use serde::{Deserialize, Serialize};

/// The three lines every win check walks over: rows, columns, diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A board, 9 cells read left-to-right, top-to-bottom. Whose turn it is
/// isn't stored separately -- it's always derivable from how many marks
/// are on the board, since X moves first and turns alternate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    cells: [Option<Mark>; 9],
}

impl Position {
    fn empty() -> Self {
        Position { cells: [None; 9] }
    }

    fn mark_counts(&self) -> (usize, usize) {
        let x = self.cells.iter().filter(|c| **c == Some(Mark::X)).count();
        let o = self.cells.iter().filter(|c| **c == Some(Mark::O)).count();
        (x, o)
    }

    /// The mark whose turn it is to move at this position.
    fn to_move(&self) -> Mark {
        let (x, o) = self.mark_counts();
        if x > o { Mark::O } else { Mark::X }
    }

    /// The mark holding three in a row, if any.
    fn winner(&self) -> Option<Mark> {
        LINES.into_iter().find_map(|line| {
            let [a, b, c] = line.map(|i| self.cells[i]);
            if a.is_some() && a == b && b == c { a } else { None }
        })
    }

    fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

/// Tic-tac-toe from the empty board, the only opening either player ever
/// actually reaches by symmetry, but every legal intermediate position is
/// still explored by `successors`.
pub struct TicTacToe;

impl GameRules for TicTacToe {
    type Position = Position;

    fn initial_position(&self) -> Position {
        Position::empty()
    }

    fn is_primitive(&self, position: &Position) -> bool {
        position.winner().is_some() || position.is_full()
    }

    fn primitive_value(&self, position: &Position) -> Outcome {
        match position.winner() {
            // Whoever's mark just completed a line already moved; the
            // player to move now inherited a lost board.
            Some(winner) => {
                debug_assert_eq!(position.to_move(), winner.other());
                Outcome::Loss
            }
            None => Outcome::Tie,
        }
    }

    fn successors(&self, position: &Position) -> Vec<Position> {
        let mover = position.to_move();
        position
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| {
                let mut next = position.clone();
                next.cells[index] = Some(mover);
                next
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Worker;

    fn board(cells: [Option<Mark>; 9]) -> Position {
        Position { cells }
    }

    #[test]
    fn empty_board_is_not_primitive() {
        let rules = TicTacToe;
        assert!(!rules.is_primitive(&Position::empty()));
    }

    #[test]
    fn empty_board_has_nine_successors() {
        let rules = TicTacToe;
        assert_eq!(rules.successors(&Position::empty()).len(), 9);
    }

    #[test]
    fn a_completed_row_is_primitive_and_a_loss_for_the_mover() {
        use Mark::*;
        let won = board([
            Some(X), Some(X), Some(X),
            Some(O), Some(O), None,
            None,    None,    None,
        ]);
        let rules = TicTacToe;
        assert!(rules.is_primitive(&won));
        assert_eq!(rules.primitive_value(&won), Outcome::Loss);
    }

    #[test]
    fn a_full_board_with_no_winner_is_a_tie() {
        use Mark::*;
        let drawn = board([
            Some(X), Some(O), Some(X),
            Some(X), Some(O), Some(O),
            Some(O), Some(X), Some(X),
        ]);
        let rules = TicTacToe;
        assert!(rules.is_primitive(&drawn));
        assert_eq!(rules.primitive_value(&drawn), Outcome::Tie);
    }

    #[test]
    fn to_move_alternates_starting_with_x() {
        assert_eq!(Position::empty().to_move(), Mark::X);
        let one_move = board([
            Some(Mark::X), None, None,
            None, None, None,
            None, None, None,
        ]);
        assert_eq!(one_move.to_move(), Mark::O);
    }

    /// `TicTacToe::initial_position` always returns the empty board, so
    /// solving from a fixed mid-game position needs a thin rules wrapper
    /// that only overrides which board the fleet starts from.
    struct FromPosition(Position);

    impl GameRules for FromPosition {
        type Position = Position;

        fn initial_position(&self) -> Position {
            self.0.clone()
        }

        fn is_primitive(&self, position: &Position) -> bool {
            TicTacToe.is_primitive(position)
        }

        fn primitive_value(&self, position: &Position) -> Outcome {
            TicTacToe.primitive_value(position)
        }

        fn successors(&self, position: &Position) -> Vec<Position> {
            TicTacToe.successors(position)
        }
    }

    /// O to move, with both an immediate win (completing the 0-4-8
    /// diagonal by playing cell 8) and a drawing alternative (cell 7)
    /// on the board. A full solve through `Worker` should still prefer
    /// the win: O@8 in 1 move.
    #[test]
    fn worker_solves_a_board_with_an_immediate_win_over_a_drawing_line() {
        use Mark::*;
        let position = board([
            Some(O), Some(X), Some(O),
            Some(X), Some(O), Some(X),
            Some(X), None,    None,
        ]);

        let transport = transport::mem::build_fleet::<Position>(1).pop().unwrap();
        let mut worker = Worker::new(FromPosition(position), transport);
        let outcome = worker.run().unwrap();
        assert_eq!(outcome, Some((Outcome::Win, 1)));
    }
}
