//! Minimax over an explicitly materialized game tree that never holds more
//! than `max_nodes_count` nodes.
//!
//! Two construction strategies are available, selected by
//! [`Config::static_tree`]:
//!
//! - **Static**: the tree is built breadth-first, one level at a time, until
//!   `max_depth` is reached or the arena is full. Nodes that could not be
//!   expanded are evaluated in place and a bottom-up sweep propagates the
//!   scores to the root.
//! - **Dynamic**: depth-first traversal that keeps only the current path in
//!   the arena, releasing every child as soon as its subtree is scored.
//!
//! Unlike [`crate::search::AlphaBeta`], scores are never negated: even depths
//! maximize and odd depths minimize the evaluation.

use std::time::Instant;

use anyhow::ensure;
use tracing::{debug, trace};

use crate::arena::{Arena, NodeId};
use crate::resolver::StaticEvaluation;
use crate::search::{Config, Depth, Minimax, Operation, SearchResult};
use crate::task::StopSignal;

#[derive(Debug)]
struct TreeNode<S, M> {
    state: S,
    parent: Option<NodeId>,
    /// Move that leads from the parent to this node.
    parent_move: Option<M>,
    children: usize,
    result: SearchResult<M>,
}

impl<S, M> TreeNode<S, M> {
    const fn new(state: S, parent: Option<NodeId>, parent_move: Option<M>) -> Self {
        Self {
            state,
            parent,
            parent_move,
            children: 0,
            result: SearchResult::leaf(0.0),
        }
    }
}

/// Minimax engine with a hard ceiling on the number of nodes.
#[derive(Debug)]
pub struct BoundedMinimax<R: StaticEvaluation> {
    resolver: R,
    config: Config,
    capacity: usize,
    arena: Arena<TreeNode<R::State, R::Move>>,
    /// Nodes of the static tree grouped by depth.
    levels: Vec<Vec<NodeId>>,
    peak_nodes: usize,
    stop: StopSignal,
}

impl<R: StaticEvaluation> BoundedMinimax<R> {
    /// Creates the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_nodes_count` is not set or if the rest of the
    /// configuration is inconsistent (see [`Config::validate`]).
    pub fn new(resolver: R, config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let capacity = config.max_nodes_count.unwrap_or_default();
        ensure!(
            capacity > 0,
            "max_nodes_count is required to bound the tree size"
        );
        Ok(Self {
            resolver,
            config,
            capacity,
            arena: Arena::new(),
            levels: Vec::new(),
            peak_nodes: 0,
            stop: StopSignal::new(),
        })
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

    /// Number of nodes held by the arena after the last search. In dynamic
    /// mode everything is released by the end of the search except the root.
    #[must_use]
    pub fn allocated_nodes(&self) -> usize {
        self.arena.len()
    }

    /// Largest number of nodes held at the same time during the last search.
    #[must_use]
    pub const fn peak_nodes(&self) -> usize {
        self.peak_nodes
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
    pub fn find_solution(&mut self, state: &R::State) -> Option<R::Move> {
        let timer = Instant::now();
        self.arena.reset(self.capacity);
        self.levels.clear();
        self.peak_nodes = 0;

        let root = self
            .arena
            .allocate(TreeNode::new(state.clone(), None, None))?;
        let result = if self.config.static_tree {
            self.build_levels(root)
                .then(|| self.sweep(root))
        } else {
            self.visit(root, 0)
        };

        debug!(
            static_tree = self.config.static_tree,
            interrupted = result.is_none(),
            allocated_nodes = self.allocated_nodes(),
            peak_nodes = self.peak_nodes,
            elapsed = ?timer.elapsed(),
            "bounded minimax search finished"
        );
        result.and_then(|result| result.best_move)
    }

    /// Expands the tree breadth-first. Returns `false` if the search was
    /// interrupted.
    fn build_levels(&mut self, root: NodeId) -> bool {
        self.levels.push(vec![root]);
        for depth in 0..usize::from(self.config.max_depth) {
            if self.arena.is_full() {
                break;
            }
            let mut next_level = Vec::new();
            for index in 0..self.levels[depth].len() {
                if self.stop.is_requested() {
                    trace!(depth, "bounded minimax received stop request");
                    return false;
                }
                if self.arena.is_full() {
                    break;
                }
                let id = self.levels[depth][index];
                let moves = self.resolver.collect_moves(&self.arena.get(id).state);
                for next_move in moves.as_ref() {
                    let mut state = self.arena.get(id).state.clone();
                    self.resolver.apply_move(&mut state, next_move);
                    let Some(child) = self.arena.allocate(TreeNode::new(
                        state,
                        Some(id),
                        Some(next_move.clone()),
                    )) else {
                        break;
                    };
                    self.arena.get_mut(id).children += 1;
                    next_level.push(child);
                }
            }
            if next_level.is_empty() {
                break;
            }
            self.levels.push(next_level);
        }
        self.peak_nodes = self.arena.len();
        true
    }

    /// Scores the nodes without children and propagates the scores from the
    /// deepest level up to the root.
    fn sweep(&mut self, root: NodeId) -> SearchResult<R::Move> {
        for (depth, level) in self.levels.iter().enumerate() {
            for &id in level {
                let node = self.arena.get(id);
                let score = if node.children == 0 {
                    self.resolver.evaluate(&node.state)
                } else {
                    Operation::at(depth).initial()
                };
                self.arena.get_mut(id).result = SearchResult::leaf(score);
            }
        }

        for (depth, level) in self.levels.iter().enumerate().skip(1).rev() {
            let operation = Operation::at(depth - 1);
            for &id in level {
                let node = self.arena.get(id);
                let (Some(parent), score) = (node.parent, node.result.score) else {
                    continue;
                };
                let parent_move = node.parent_move.clone();
                let parent_result = &mut self.arena.get_mut(parent).result;
                if operation.prefers(score, parent_result.score) {
                    parent_result.score = score;
                    parent_result.best_move = parent_move;
                }
            }
        }

        self.arena.get(root).result.clone()
    }

    /// Depth-first search keeping only the current path in the arena. Returns
    /// `None` if the search was interrupted.
    fn visit(&mut self, id: NodeId, depth: Depth) -> Option<SearchResult<R::Move>> {
        self.peak_nodes = self.peak_nodes.max(self.arena.len());

        let moves = if depth == self.config.max_depth || self.arena.is_full() {
            None
        } else {
            Some(self.resolver.collect_moves(&self.arena.get(id).state))
        };
        let moves = match moves {
            Some(moves) if !moves.as_ref().is_empty() => moves,
            _ => {
                return Some(SearchResult::leaf(
                    self.resolver.evaluate(&self.arena.get(id).state),
                ))
            },
        };

        let operation = Operation::at(depth.into());
        let mut best_result = SearchResult::leaf(operation.initial());
        for next_move in moves.as_ref() {
            if self.stop.is_requested() {
                trace!(depth, "bounded minimax received stop request");
                return None;
            }

            let mut state = self.arena.get(id).state.clone();
            self.resolver.apply_move(&mut state, next_move);
            let child = self
                .arena
                .allocate(TreeNode::new(state, Some(id), Some(next_move.clone())))?;
            let result = self.visit(child, depth + 1);
            drop(self.arena.free_last());
            let score = result?.score;

            if operation.prefers(score, best_result.score) {
                best_result.score = score;
                best_result.best_move = Some(next_move.clone());
            }
        }
        Some(best_result)
    }
}

impl<R: StaticEvaluation> Minimax for BoundedMinimax<R> {
    type Move = R::Move;
    type State = R::State;

    fn find_solution(&mut self, state: &Self::State) -> Option<Self::Move> {
        Self::find_solution(self, state)
    }

    fn stop_signal(&self) -> StopSignal {
        Self::stop_signal(self)
    }
}
