use anyhow::ensure;

use crate::search::{Depth, Score};

/// How a playout outcome is accumulated along the path to the root.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Backpropagation {
    /// Every ancestor receives the same outcome. Suitable for single-agent
    /// problems and for playouts that already score from the root player's
    /// point of view.
    #[default]
    Shared,
    /// The outcome is negated at every ply. The playout must report the
    /// result for the player who made the move leading to the simulated
    /// node, and outcomes should be symmetric around zero (e.g. `1` win, `0`
    /// draw, `-1` loss).
    Alternating,
}

/// Search parameters shared by all engines. Each engine only reads the knobs
/// that are relevant to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Maximum number of plies explored below the root.
    pub max_depth: Depth,
    /// Hard ceiling on the number of nodes. Mandatory for
    /// [`crate::search::BoundedMinimax`], optional everywhere else.
    pub max_nodes_count: Option<usize>,
    /// Initial alpha bound.
    pub min_value: Score,
    /// Initial beta bound.
    pub max_value: Score,
    /// Tolerance of the alpha-beta cutoff: siblings are pruned once
    /// `alpha + epsilon >= beta`.
    pub epsilon: Score,
    /// UCT exploration constant.
    pub exploration_param: Score,
    /// Seed of the MCTS random number generator.
    pub random_seed: u64,
    /// Pre-build the whole tree breadth-first (`true`) or build it depth-first
    /// one path at a time (`false`).
    pub static_tree: bool,
    /// Score propagation policy of MCTS.
    pub backpropagation: Backpropagation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_nodes_count: None,
            min_value: -1.0,
            max_value: 1.0,
            epsilon: Score::EPSILON,
            exploration_param: std::f32::consts::SQRT_2,
            random_seed: 0,
            static_tree: false,
            backpropagation: Backpropagation::Shared,
        }
    }
}

impl Config {
    /// Number of MCTS nodes reserved when `max_nodes_count` is not set.
    pub const DEFAULT_TREE_CAPACITY: usize = 1 << 18;

    /// Checks that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns an error if the score bounds are inverted, if a tolerance is
    /// negative or not finite, or if the node ceiling is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.min_value < self.max_value,
            "min_value ({}) should be less than max_value ({})",
            self.min_value,
            self.max_value
        );
        ensure!(
            self.epsilon.is_finite() && self.epsilon >= 0.0,
            "epsilon should be a non-negative number, got {}",
            self.epsilon
        );
        ensure!(
            self.exploration_param.is_finite() && self.exploration_param >= 0.0,
            "exploration_param should be a non-negative number, got {}",
            self.exploration_param
        );
        if let Some(max_nodes_count) = self.max_nodes_count {
            ensure!(max_nodes_count > 0, "max_nodes_count should be positive");
        }
        Ok(())
    }

    /// Capacity of the MCTS node arena.
    #[must_use]
    pub fn tree_capacity(&self) -> usize {
        self.max_nodes_count.unwrap_or(Self::DEFAULT_TREE_CAPACITY)
    }
}
