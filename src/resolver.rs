//! Game logic plugs into the search engines through the traits in this
//! module. The engines never look inside a state or a move: everything they
//! need to know about the game is asked from the resolver.

use crate::search::Score;

/// Rules of the game: which moves are legal and what they do.
///
/// A state with no legal moves is terminal.
pub trait Resolver {
    /// Game position. Cloned whenever the engine needs to branch.
    type State: Clone;
    /// Transition between two states.
    type Move: Clone + PartialEq;
    /// Ordered container of moves produced by [`Resolver::collect_moves`].
    /// Engines visit moves in the order they appear in it.
    type Moves: AsRef<[Self::Move]> + AsMut<[Self::Move]>;

    /// Lists all legal moves in `state`. An empty container means the state
    /// is terminal.
    fn collect_moves(&self, state: &Self::State) -> Self::Moves;

    /// Transforms `state` in place by playing `next_move`.
    fn apply_move(&self, state: &mut Self::State, next_move: &Self::Move);
}

/// Static evaluation used by the minimax engines.
pub trait StaticEvaluation: Resolver {
    /// Scores `state` from one fixed perspective (usually the player to move
    /// at the root of the search). Higher is better for that player.
    fn evaluate(&self, state: &Self::State) -> Score;
}

/// Randomized simulation used by Monte Carlo Tree Search.
pub trait Playout: Resolver {
    /// Plays the game out from `state` and returns the outcome. The meaning of
    /// the sign depends on [`crate::search::Backpropagation`].
    fn playout(&mut self, state: &Self::State) -> Score;
}
