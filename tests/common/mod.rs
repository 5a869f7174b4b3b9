//! Tic-tac-toe implemented on top of the resolver traits.

#![allow(dead_code)]

use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use treesearch::search::Score;
use treesearch::{Playout, Resolver, StaticEvaluation};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Player {
    X,
    O,
}

impl Player {
    pub(crate) const fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Winner(Player),
    Draw,
}

/// Row and column of the cell.
pub(crate) type Move = (usize, usize);

pub(crate) type Moves = ArrayVec<Move, 9>;

const LINES: [[Move; 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(2, 0), (1, 1), (0, 2)],
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Board {
    cells: [[Option<Player>; 3]; 3],
    pub(crate) to_move: Player,
}

impl Board {
    pub(crate) const fn empty(to_move: Player) -> Self {
        Self {
            cells: [[None; 3]; 3],
            to_move,
        }
    }

    /// Parses rows of `X`, `O` and `-` (empty cell).
    pub(crate) fn parse(rows: [&str; 3], to_move: Player) -> Self {
        let mut board = Self::empty(to_move);
        for (row, line) in rows.iter().enumerate() {
            assert_eq!(line.len(), 3, "expected 3 cells in row {row}, got {line:?}");
            for (column, symbol) in line.chars().enumerate() {
                board.cells[row][column] = match symbol {
                    'X' => Some(Player::X),
                    'O' => Some(Player::O),
                    '-' => None,
                    _ => panic!("unexpected cell {symbol:?}"),
                };
            }
        }
        board
    }

    pub(crate) fn play(&mut self, (row, column): Move) {
        assert!(
            self.cells[row][column].is_none(),
            "cell ({row}, {column}) is taken"
        );
        self.cells[row][column] = Some(self.to_move);
        self.to_move = self.to_move.opponent();
    }

    pub(crate) fn winner(&self) -> Option<Player> {
        LINES.into_iter().find_map(|line| {
            let [first, second, third] = line.map(|(row, column)| self.cells[row][column]);
            if first.is_some() && first == second && second == third {
                first
            } else {
                None
            }
        })
    }

    /// Returns `None` while the game is not finished.
    pub(crate) fn outcome(&self) -> Option<Outcome> {
        if let Some(winner) = self.winner() {
            return Some(Outcome::Winner(winner));
        }
        self.cells
            .iter()
            .flatten()
            .all(Option::is_some)
            .then_some(Outcome::Draw)
    }

    pub(crate) fn legal_moves(&self) -> Moves {
        let mut moves = Moves::new();
        if self.winner().is_some() {
            return moves;
        }
        for row in 0..3 {
            for column in 0..3 {
                if self.cells[row][column].is_none() {
                    moves.push((row, column));
                }
            }
        }
        moves
    }
}

/// Resolver that evaluates positions for `player`. Playouts are random games
/// scored for the player who made the last move: `1` win, `0` draw, `-1`
/// loss.
#[derive(Clone, Debug)]
pub(crate) struct TicTacToe {
    player: Player,
    rng: ChaCha20Rng,
}

impl TicTacToe {
    pub(crate) fn new(player: Player) -> Self {
        Self::with_seed(player, 0)
    }

    pub(crate) fn with_seed(player: Player, seed: u64) -> Self {
        Self {
            player,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl Resolver for TicTacToe {
    type Move = Move;
    type Moves = Moves;
    type State = Board;

    fn collect_moves(&self, state: &Self::State) -> Self::Moves {
        state.legal_moves()
    }

    fn apply_move(&self, state: &mut Self::State, next_move: &Self::Move) {
        state.play(*next_move);
    }
}

impl StaticEvaluation for TicTacToe {
    fn evaluate(&self, state: &Self::State) -> Score {
        match state.winner() {
            Some(winner) if winner == self.player => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        }
    }
}

impl Playout for TicTacToe {
    fn playout(&mut self, state: &Self::State) -> Score {
        let mover = state.to_move.opponent();
        let mut board = *state;
        loop {
            match board.outcome() {
                Some(Outcome::Winner(winner)) if winner == mover => return 1.0,
                Some(Outcome::Winner(_)) => return -1.0,
                Some(Outcome::Draw) => return 0.0,
                None => {},
            }
            let moves = board.legal_moves();
            match moves.choose(&mut self.rng) {
                Some(&next_move) => board.play(next_move),
                None => return 0.0,
            }
        }
    }
}

/// Plays the game until the end, asking `next_move` for the moves of both
/// sides.
pub(crate) fn play_game(
    mut board: Board,
    mut next_move: impl FnMut(&Board) -> Move,
) -> Outcome {
    loop {
        if let Some(outcome) = board.outcome() {
            return outcome;
        }
        let chosen = next_move(&board);
        board.play(chosen);
    }
}
