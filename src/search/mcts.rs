//! [Monte Carlo Tree Search] with the [UCT] selection policy.
//!
//! The tree is created once for a root position and grows by one simulated
//! node per [`Mcts::iterate`] call:
//!
//! 1. **Selection**: descend from the root, taking the first child that was
//!    never simulated or, once all children were, the one maximizing
//!    `mean + c * sqrt(ln(parent visits) / child visits)`.
//! 2. **Expansion**: when a node is reached for the first time its state is
//!    derived from the parent and its children are created in a random
//!    (seeded) order.
//! 3. **Simulation**: [`Playout::playout`] scores the new node. Terminal
//!    nodes that are reached again reuse their mean score.
//! 4. **Backpropagation**: every node on the path gets one more visit and the
//!    score, negated at every ply for [`Backpropagation::Alternating`].
//!
//! The tree lives in an [`Arena`] and never grows beyond
//! [`Config::tree_capacity`] nodes. A node whose children do not fit stays a
//! leaf and is simulated again every time it is reached.
//!
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search
//! [UCT]: https://www.chessprogramming.org/UCT

use anyhow::Context;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, trace};

use crate::arena::{Arena, NodeId};
use crate::resolver::Playout;
use crate::search::telemetry::MctsStats;
use crate::search::{first_max_by_key, Backpropagation, Config, Score};

#[derive(Debug)]
struct MctsNode<S, M> {
    /// Materialized on the first visit.
    state: Option<S>,
    parent: Option<NodeId>,
    /// Move that leads from the parent to this node. Only the root has none.
    parent_move: Option<M>,
    children: Vec<NodeId>,
    expanded: bool,
    visits: u32,
    score: Score,
}

impl<S, M> MctsNode<S, M> {
    const fn new(state: Option<S>, parent: Option<NodeId>, parent_move: Option<M>) -> Self {
        Self {
            state,
            parent,
            parent_move,
            children: Vec::new(),
            expanded: false,
            visits: 0,
            score: 0.0,
        }
    }

    fn mean_score(&self) -> Score {
        self.score / self.visits as Score
    }
}

/// Visit count of a single root move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildSummary<M> {
    /// Move played at the root.
    pub next_move: M,
    /// Number of iterations that went through the move.
    pub visits: u32,
}

/// Visit counts of all root moves. Summaries of independent searches of the
/// same position can be merged to pick a move by their combined votes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootSummary<M> {
    /// Root moves in the order they are explored.
    pub children: Vec<ChildSummary<M>>,
}

impl<M> Default for RootSummary<M> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
        }
    }
}

impl<M: Clone + PartialEq> RootSummary<M> {
    /// Adds the visits of `other` to the matching moves, appending the moves
    /// that are not present yet.
    pub fn merge(&mut self, other: &Self) {
        for child in &other.children {
            match self
                .children
                .iter_mut()
                .find(|known| known.next_move == child.next_move)
            {
                Some(known) => known.visits += child.visits,
                None => self.children.push(child.clone()),
            }
        }
    }

    /// Most visited move. The first one wins ties.
    #[must_use]
    pub fn best_move(&self) -> Option<&M> {
        first_max_by_key(&self.children, |child| child.visits).map(|child| &child.next_move)
    }
}

/// Incremental Monte Carlo Tree Search over a single root position.
#[derive(Debug)]
pub struct Mcts<R: Playout> {
    resolver: R,
    config: Config,
    arena: Arena<MctsNode<R::State, R::Move>>,
    root: NodeId,
    rng: ChaCha20Rng,
    stats: Option<MctsStats>,
    iterations: u64,
}

impl<R: Playout> Mcts<R> {
    /// Creates the tree for `state` and expands the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is inconsistent (see
    /// [`Config::validate`]).
    pub fn new(resolver: R, state: R::State, config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let mut arena = Arena::with_capacity(config.tree_capacity());
        let root = arena
            .allocate(MctsNode::new(Some(state), None, None))
            .context("tree capacity should fit the root")?;
        let mut mcts = Self {
            resolver,
            rng: ChaCha20Rng::seed_from_u64(config.random_seed),
            config,
            arena,
            root,
            stats: None,
            iterations: 0,
        };
        let _ = mcts.expand(root, 0);
        Ok(mcts)
    }

    /// Enables per-depth statistics collection.
    #[must_use]
    pub fn with_telemetry(mut self) -> Self {
        let mut stats = MctsStats::default();
        let root = self.arena.get(self.root);
        if root.expanded {
            stats.expand(0, root.children.len());
        }
        self.stats = Some(stats);
        self
    }

    /// Statistics collected since telemetry was enabled.
    #[must_use]
    pub const fn stats(&self) -> Option<&MctsStats> {
        self.stats.as_ref()
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

    /// Number of completed iterations.
    #[must_use]
    pub const fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Number of nodes in the tree, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Runs `iterations` iterations.
    pub fn run(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.iterate();
        }
        debug!(
            iterations = self.iterations,
            nodes = self.node_count(),
            "mcts run finished"
        );
    }

    /// Performs one selection, expansion, simulation and backpropagation
    /// round.
    pub fn iterate(&mut self) {
        let mut current = self.root;
        let mut depth = 0;
        let score = loop {
            if self.arena.get(current).state.is_none() {
                self.materialize(current);
                let _ = self.expand(current, depth);
                break self.simulate(current);
            }
            if !self.arena.get(current).expanded && !self.expand(current, depth) {
                break self.simulate(current);
            }
            match self.select_child(current) {
                Some(child) => {
                    current = child;
                    depth += 1;
                },
                None => {
                    let node = self.arena.get(current);
                    if node.visits == 0 {
                        break self.simulate(current);
                    }
                    break node.mean_score();
                },
            }
        };

        trace!(depth, score, "mcts iteration finished");
        if let Some(stats) = &mut self.stats {
            stats.visit(depth);
        }
        self.backpropagate(current, score);
        self.iterations += 1;
    }

    /// The most visited root move. The first one in the (shuffled) child order
    /// wins ties. Returns `None` if the root is terminal.
    #[must_use]
    pub fn best_move(&self) -> Option<R::Move> {
        let root = self.arena.get(self.root);
        first_max_by_key(&root.children, |&&child| self.arena.get(child).visits)
            .and_then(|&child| self.arena.get(child).parent_move.clone())
    }

    /// Visit counts of the root moves.
    #[must_use]
    pub fn summary(&self) -> RootSummary<R::Move> {
        RootSummary {
            children: self
                .arena
                .get(self.root)
                .children
                .iter()
                .filter_map(|&child| {
                    let child = self.arena.get(child);
                    Some(ChildSummary {
                        next_move: child.parent_move.clone()?,
                        visits: child.visits,
                    })
                })
                .collect(),
        }
    }

    /// Derives the node state from its parent.
    fn materialize(&mut self, id: NodeId) {
        let node = self.arena.get(id);
        let (Some(parent), Some(next_move)) = (node.parent, &node.parent_move) else {
            return;
        };
        let Some(mut state) = self.arena.get(parent).state.clone() else {
            debug_assert!(false, "parent state should be materialized first");
            return;
        };
        self.resolver.apply_move(&mut state, next_move);
        self.arena.get_mut(id).state = Some(state);
    }

    /// Creates the children of a materialized node. Returns `false` if they
    /// do not fit into the tree.
    fn expand(&mut self, id: NodeId, depth: usize) -> bool {
        let Some(state) = &self.arena.get(id).state else {
            return false;
        };
        let mut moves = self.resolver.collect_moves(state);
        if moves.as_ref().len() > self.arena.remaining() {
            trace!(depth, "mcts tree is full, expansion deferred");
            return false;
        }
        moves.as_mut().shuffle(&mut self.rng);

        let children: Vec<NodeId> = moves
            .as_ref()
            .iter()
            .filter_map(|next_move| {
                self.arena
                    .allocate(MctsNode::new(None, Some(id), Some(next_move.clone())))
            })
            .collect();
        if let Some(stats) = &mut self.stats {
            stats.expand(depth, children.len());
        }
        let node = self.arena.get_mut(id);
        node.children = children;
        node.expanded = true;
        true
    }

    fn simulate(&mut self, id: NodeId) -> Score {
        self.arena
            .get(id)
            .state
            .as_ref()
            .map_or(0.0, |state| self.resolver.playout(state))
    }

    fn select_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.arena.get(id);
        if let Some(&unvisited) = node
            .children
            .iter()
            .find(|&&child| self.arena.get(child).visits == 0)
        {
            return Some(unvisited);
        }
        let log_visits = (node.visits as Score).ln();
        first_max_by_key(node.children.iter().copied(), |&child| {
            let child = self.arena.get(child);
            self.config
                .exploration_param
                .mul_add((log_visits / child.visits as Score).sqrt(), child.mean_score())
        })
    }

    fn backpropagate(&mut self, id: NodeId, mut score: Score) {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.arena.get_mut(id);
            node.visits += 1;
            node.score += score;
            if self.config.backpropagation == Backpropagation::Alternating {
                score = -score;
            }
            current = node.parent;
        }
    }
}
