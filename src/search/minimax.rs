//! Implementation of [Minimax] algorithm with [Negamax] and [Alpha-Beta
//! pruning] extensions.
//!
//! Scores returned by [`StaticEvaluation::evaluate`] are always expressed from
//! the perspective of the player to move at the root. The recursion flips the
//! sign at odd depths, so every node maximizes its own score.
//!
//! [Minimax]: https://en.wikipedia.org/wiki/Minimax
//! [Negamax]: https://en.wikipedia.org/wiki/Negamax
//! [Alpha-Beta pruning]: https://en.wikipedia.org/wiki/Alpha%E2%80%93beta_pruning

use std::time::Instant;

use tracing::{debug, trace};

use crate::resolver::StaticEvaluation;
use crate::search::telemetry::NegamaxStats;
use crate::search::{Config, Depth, Minimax, Score, SearchResult};
use crate::task::StopSignal;

/// Depth-bounded negamax search with alpha-beta pruning and cooperative
/// cancellation.
///
/// Moves are explored in the order given by the resolver and a move only
/// replaces the current best one if it is strictly better, which makes the
/// result deterministic and independent of pruning.
#[derive(Debug)]
pub struct AlphaBeta<R: StaticEvaluation> {
    resolver: R,
    config: Config,
    stop: StopSignal,
    stats: Option<NegamaxStats>,
    visited_nodes: usize,
}

impl<R: StaticEvaluation> AlphaBeta<R> {
    /// Creates the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is inconsistent (see
    /// [`Config::validate`]).
    pub fn new(resolver: R, config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver,
            config,
            stop: StopSignal::new(),
            stats: None,
            visited_nodes: 0,
        })
    }

    /// Enables per-depth statistics collection.
    #[must_use]
    pub fn with_telemetry(mut self) -> Self {
        self.stats = Some(NegamaxStats::default());
        self
    }

    /// Statistics of the last search, if telemetry is enabled.
    #[must_use]
    pub const fn stats(&self) -> Option<&NegamaxStats> {
        self.stats.as_ref()
    }

    /// Number of nodes entered by the last search.
    #[must_use]
    pub const fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }

    /// Parameters the engine was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Resolver that was moved into the engine.
    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Returns a handle that interrupts the running search from another
    /// thread.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Clears any pending stop request and searches for the best move.
    ///
    /// Returns `None` if the root is terminal, if `max_depth` is zero or if the
    /// search was interrupted.
    pub fn solve(&mut self, state: &R::State) -> Option<R::Move> {
        self.stop.reset();
        self.find_solution(state)
    }

    /// Searches for the best move, giving up as soon as a stop is requested.
    ///
    /// A stop that was requested before the call is honoured: the search
    /// returns `None` without exploring any move. An interrupted search never
    /// reports a partial result, because the bounds of the frames that were
    /// being explored are incomplete.
    pub fn find_solution(&mut self, state: &R::State) -> Option<R::Move> {
        let timer = Instant::now();
        self.visited_nodes = 0;
        if let Some(stats) = &mut self.stats {
            stats.reset();
        }

        let result = self.visit(state, 0, self.config.min_value, self.config.max_value);

        match &result {
            Some(result) => debug!(
                score = result.score,
                found = result.best_move.is_some(),
                visited_nodes = self.visited_nodes,
                elapsed = ?timer.elapsed(),
                "negamax search finished"
            ),
            None => debug!(
                visited_nodes = self.visited_nodes,
                elapsed = ?timer.elapsed(),
                "negamax search interrupted"
            ),
        }
        result.and_then(|result| result.best_move)
    }

    /// Nodes entered once the budget is spent are not expanded.
    fn budget_exhausted(&self) -> bool {
        self.config
            .max_nodes_count
            .is_some_and(|max_nodes_count| self.visited_nodes >= max_nodes_count)
    }

    /// Returns `None` if the search was interrupted.
    fn visit(
        &mut self,
        state: &R::State,
        depth: Depth,
        mut alpha: Score,
        beta: Score,
    ) -> Option<SearchResult<R::Move>> {
        let moves = if depth == self.config.max_depth || self.budget_exhausted() {
            None
        } else {
            Some(self.resolver.collect_moves(state))
        };
        self.visited_nodes += 1;
        if let Some(stats) = &mut self.stats {
            stats.visit(depth.into());
        }

        let moves = match moves {
            Some(moves) if !moves.as_ref().is_empty() => moves,
            _ => {
                if let Some(stats) = &mut self.stats {
                    stats.evaluate(depth.into());
                }
                // Players alternate every ply and the evaluation is relative
                // to the root player.
                let color = if depth % 2 == 0 { 1.0 } else { -1.0 };
                return Some(SearchResult::leaf(color * self.resolver.evaluate(state)));
            },
        };
        let moves = moves.as_ref();

        let mut best_result = SearchResult {
            score: Score::MIN,
            best_move: None,
        };
        for (index, next_move) in moves.iter().enumerate() {
            if self.stop.is_requested() {
                trace!(depth, "negamax search received stop request");
                return None;
            }

            let mut child = state.clone();
            self.resolver.apply_move(&mut child, next_move);
            let score = -self.visit(&child, depth + 1, -beta, -alpha)?.score;

            if score > best_result.score {
                best_result.score = score;
                best_result.best_move = Some(next_move.clone());
                alpha = alpha.max(score);
                if alpha + self.config.epsilon >= beta {
                    if let Some(stats) = &mut self.stats {
                        stats.prune(usize::from(depth) + 1, moves.len() - index - 1);
                    }
                    break;
                }
            }
        }
        Some(best_result)
    }
}

impl<R: StaticEvaluation> Minimax for AlphaBeta<R> {
    type Move = R::Move;
    type State = R::State;

    fn find_solution(&mut self, state: &Self::State) -> Option<Self::Move> {
        Self::find_solution(self, state)
    }

    fn stop_signal(&self) -> StopSignal {
        Self::stop_signal(self)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::search::telemetry::DepthCounters;
    use crate::search::testing::{leaf, node, textbook, ExplicitTree, InterruptingTree};

    fn engine(root: crate::search::testing::Node, max_depth: Depth) -> AlphaBeta<ExplicitTree> {
        let config = Config {
            max_depth,
            min_value: -100.0,
            max_value: 100.0,
            epsilon: 0.0,
            ..Config::default()
        };
        AlphaBeta::new(ExplicitTree::new(root), config)
            .expect("valid config")
            .with_telemetry()
    }

    #[test]
    fn textbook_pruning() {
        let mut engine = engine(textbook(), 2);
        assert_eq!(engine.solve(&vec![]), Some(0));

        let stats = engine.stats().expect("telemetry is enabled");
        assert_eq!(
            stats.at(1),
            DepthCounters {
                visited: 3,
                evaluated: 0,
                pruned: 0
            }
        );
        assert_eq!(
            stats.at(2),
            DepthCounters {
                visited: 7,
                evaluated: 7,
                pruned: 2
            }
        );
        assert_eq!(engine.visited_nodes(), 11);
    }

    #[test]
    fn first_move_wins_ties() {
        let root = node(0.0, vec![leaf(1.0), leaf(5.0), leaf(5.0), leaf(-3.0)]);
        assert_eq!(engine(root, 1).solve(&vec![]), Some(1));
    }

    #[test]
    fn minimizing_opponent() {
        // The second move has the best leaf but the opponent will not allow it.
        let root = node(
            0.0,
            vec![
                node(0.0, vec![leaf(1.0), leaf(2.0)]),
                node(0.0, vec![leaf(10.0), leaf(-10.0)]),
            ],
        );
        assert_eq!(engine(root, 2).solve(&vec![]), Some(0));
    }

    #[test]
    fn depth_limit_uses_evaluation() {
        // At depth one the second child looks better even though its subtree
        // is lost.
        let root = node(
            0.0,
            vec![
                node(1.0, vec![leaf(1.0)]),
                node(2.0, vec![leaf(-5.0)]),
            ],
        );
        assert_eq!(engine(root.clone(), 1).solve(&vec![]), Some(1));
        assert_eq!(engine(root, 2).solve(&vec![]), Some(0));
    }

    #[test]
    fn terminal_root() {
        let mut engine = engine(leaf(1.0), 3);
        assert_eq!(engine.solve(&vec![]), None);
        assert_eq!(engine.visited_nodes(), 1);
    }

    #[test]
    fn zero_depth() {
        let mut engine = engine(textbook(), 0);
        assert_eq!(engine.solve(&vec![]), None);
    }

    #[test]
    fn node_budget() {
        let root = node(
            0.0,
            vec![
                node(1.0, vec![leaf(1.0)]),
                node(2.0, vec![leaf(-5.0)]),
            ],
        );
        let mut engine = engine(root, 2);
        assert_eq!(engine.solve(&vec![]), Some(0));
        assert_eq!(engine.visited_nodes(), 5);

        // Only the root and the first child are expanded, the second child is
        // judged by its static evaluation.
        engine.config.max_nodes_count = Some(2);
        assert_eq!(engine.solve(&vec![]), Some(1));
        assert_eq!(engine.visited_nodes(), 4);

        engine.config.max_nodes_count = Some(1);
        assert_eq!(engine.solve(&vec![]), Some(1));
        assert_eq!(engine.visited_nodes(), 3);
    }

    #[test]
    fn pending_stop() {
        let mut engine = engine(textbook(), 2);
        engine.stop_signal().request_stop();
        assert_eq!(engine.find_solution(&vec![]), None);
        assert_eq!(engine.visited_nodes(), 1);

        // `solve` starts from a clean state.
        assert_eq!(engine.solve(&vec![]), Some(0));
    }

    #[test]
    fn stop_below_root_discards_result() {
        // The textbook tree is fully searched after 7 evaluations. Stopping
        // earlier always leaves a sibling to check.
        for stop_after in 1..=8 {
            let config = Config {
                max_depth: 2,
                min_value: -100.0,
                max_value: 100.0,
                epsilon: 0.0,
                ..Config::default()
            };
            let mut engine = AlphaBeta::new(InterruptingTree::new(textbook(), stop_after), config)
                .expect("valid config");
            engine.resolver().attach(engine.stop_signal());

            let result = engine.solve(&vec![]);
            if stop_after < 7 {
                assert_eq!(result, None, "stopped after {stop_after} evaluations");
                assert_eq!(engine.resolver().evaluations(), stop_after);
            } else {
                assert_eq!(result, Some(0));
                assert_eq!(engine.resolver().evaluations(), 7);
            }
        }
    }

    #[test]
    fn invalid_config() {
        let config = Config {
            min_value: 0.0,
            max_value: 0.0,
            ..Config::default()
        };
        assert!(AlphaBeta::new(ExplicitTree::new(textbook()), config).is_err());
    }
}
