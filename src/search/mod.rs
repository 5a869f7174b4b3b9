//! [Search] looks ahead from a position by asking the
//! [`Resolver`](crate::resolver::Resolver) for continuations and combines
//! their evaluations into a single decision: the move to play.
//!
//! Three engines are provided:
//!
//! - [`AlphaBeta`]: depth-first [Negamax] with alpha-beta pruning and
//!   cooperative cancellation.
//! - [`BoundedMinimax`]: minimax over an explicitly materialized tree that
//!   never exceeds a hard node budget.
//! - [`Mcts`]: [Monte Carlo Tree Search] with UCT selection that keeps growing
//!   its tree for as long as it is asked to.
//!
//! [Search]: https://www.chessprogramming.org/Search
//! [Negamax]: https://en.wikipedia.org/wiki/Negamax
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

mod config;
pub mod mcts;
pub mod minimax;
pub mod telemetry;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Backpropagation, Config};
pub use mcts::{ChildSummary, Mcts, RootSummary};
pub use minimax::AlphaBeta;
pub use tree::BoundedMinimax;

use crate::task::StopSignal;

/// Common interface of the engines that answer with a single search call.
/// Lets [`crate::task::MinimaxTask`] drive any of them.
pub trait Minimax {
    /// Position the search starts from.
    type State;
    /// Answer of the search.
    type Move;

    /// Searches for the best move, giving up as soon as a stop is requested.
    /// Returns `None` if the search was interrupted or there is no move to
    /// play.
    fn find_solution(&mut self, state: &Self::State) -> Option<Self::Move>;

    /// Handle that interrupts the running search from another thread.
    fn stop_signal(&self) -> StopSignal;
}

/// Search depth in plies.
pub type Depth = u8;

/// Evaluation produced by the resolver and propagated through the tree.
pub type Score = f32;

/// Score of a subtree and the move at its root that achieves it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SearchResult<M> {
    pub(crate) score: Score,
    pub(crate) best_move: Option<M>,
}

impl<M> SearchResult<M> {
    pub(crate) const fn leaf(score: Score) -> Self {
        Self {
            score,
            best_move: None,
        }
    }
}

/// Minimax operation applied at a given depth of an explicit tree: the root
/// player maximizes, the opponent minimizes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    Max,
    Min,
}

impl Operation {
    pub(crate) const fn at(depth: usize) -> Self {
        if depth % 2 == 0 {
            Self::Max
        } else {
            Self::Min
        }
    }

    /// Score that any real evaluation improves upon.
    pub(crate) const fn initial(self) -> Score {
        match self {
            Self::Max => Score::MIN,
            Self::Min => Score::MAX,
        }
    }

    /// Strict comparison: equal scores never replace the current best, so the
    /// first move reaching a score wins ties.
    pub(crate) fn prefers(self, candidate: Score, current: Score) -> bool {
        match self {
            Self::Max => candidate > current,
            Self::Min => candidate < current,
        }
    }
}

/// Returns the first item with the largest key. Later items only win with a
/// strictly larger key.
pub(crate) fn first_max_by_key<T, K: PartialOrd>(
    items: impl IntoIterator<Item = T>,
    mut key: impl FnMut(&T) -> K,
) -> Option<T> {
    let mut best: Option<(T, K)> = None;
    for item in items {
        let item_key = key(&item);
        if best
            .as_ref()
            .map_or(true, |(_, best_key)| item_key > *best_key)
        {
            best = Some((item, item_key));
        }
    }
    best.map(|(item, _)| item)
}
