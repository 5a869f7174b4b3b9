//! Diagnostic counters collected while searching. They are write-only from
//! the engines' point of view and never influence the chosen move.
//!
//! Layouts are versioned through [`SCHEMA_VERSION`]: tools that persist or
//! compare these numbers should check it before interpreting them.

use std::fmt;

use arrayvec::ArrayVec;
use itertools::Itertools;

/// Version of the per-depth counter layout.
pub const SCHEMA_VERSION: u32 = 2;

/// Deepest ply that has its own counters. Deeper plies are not recorded.
pub const MAX_TRACKED_DEPTH: usize = 64;

/// Counters of a single ply of a minimax search.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DepthCounters {
    /// Nodes entered at this depth.
    pub visited: u64,
    /// Nodes at this depth scored by the static evaluation.
    pub evaluated: u64,
    /// Nodes at this depth skipped by alpha-beta cutoffs.
    pub pruned: u64,
}

/// Per-depth statistics of [`crate::search::AlphaBeta`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NegamaxStats {
    depths: ArrayVec<DepthCounters, { MAX_TRACKED_DEPTH + 1 }>,
}

impl NegamaxStats {
    /// Clears all counters.
    pub fn reset(&mut self) {
        self.depths.clear();
    }

    fn counters(&mut self, depth: usize) -> Option<&mut DepthCounters> {
        if depth > MAX_TRACKED_DEPTH {
            return None;
        }
        while self.depths.len() <= depth {
            self.depths.push(DepthCounters::default());
        }
        self.depths.get_mut(depth)
    }

    pub(crate) fn visit(&mut self, depth: usize) {
        if let Some(counters) = self.counters(depth) {
            counters.visited += 1;
        }
    }

    pub(crate) fn evaluate(&mut self, depth: usize) {
        if let Some(counters) = self.counters(depth) {
            counters.evaluated += 1;
        }
    }

    pub(crate) fn prune(&mut self, depth: usize, nodes: usize) {
        if let Some(counters) = self.counters(depth) {
            counters.pruned += nodes as u64;
        }
    }

    /// Counters of the given ply (all zeros if nothing was recorded there).
    #[must_use]
    pub fn at(&self, depth: usize) -> DepthCounters {
        self.depths.get(depth).copied().unwrap_or_default()
    }

    /// Sum of the counters over all plies.
    #[must_use]
    pub fn total(&self) -> DepthCounters {
        self.depths
            .iter()
            .fold(DepthCounters::default(), |total, counters| DepthCounters {
                visited: total.visited + counters.visited,
                evaluated: total.evaluated + counters.evaluated,
                pruned: total.pruned + counters.pruned,
            })
    }

    /// Deepest ply that was reached, if any node was visited at all.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.depths.len().checked_sub(1)
    }
}

impl fmt::Display for NegamaxStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        writeln!(f, "Visited nodes count: {}", total.visited)?;
        writeln!(f, "Evaluated nodes count: {}", total.evaluated)?;
        writeln!(f, "Pruned nodes count:")?;
        write!(
            f,
            "{}",
            self.depths
                .iter()
                .enumerate()
                .skip(1)
                .map(|(depth, counters)| format!("{depth}: {}", counters.pruned))
                .join("\n")
        )
    }
}

/// Per-depth statistics of [`crate::search::Mcts`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MctsStats {
    created: Vec<u64>,
    visited: Vec<u64>,
}

fn bump(counters: &mut Vec<u64>, depth: usize, amount: u64) {
    if counters.len() <= depth {
        counters.resize(depth + 1, 0);
    }
    counters[depth] += amount;
}

impl MctsStats {
    /// Clears all counters.
    pub fn reset(&mut self) {
        self.created.clear();
        self.visited.clear();
    }

    /// Records `children` new nodes below a node at `depth`.
    pub(crate) fn expand(&mut self, depth: usize, children: usize) {
        bump(&mut self.created, depth + 1, children as u64);
    }

    /// Records a simulation starting at a node at `depth`.
    pub(crate) fn visit(&mut self, depth: usize) {
        bump(&mut self.visited, depth, 1);
    }

    /// Nodes created at the given depth.
    #[must_use]
    pub fn created_at(&self, depth: usize) -> u64 {
        self.created.get(depth).copied().unwrap_or_default()
    }

    /// Simulations started at the given depth.
    #[must_use]
    pub fn visited_at(&self, depth: usize) -> u64 {
        self.visited.get(depth).copied().unwrap_or_default()
    }

    /// Total number of nodes created below the root.
    #[must_use]
    pub fn total_created(&self) -> u64 {
        self.created.iter().sum()
    }

    /// Total number of simulations.
    #[must_use]
    pub fn total_visited(&self) -> u64 {
        self.visited.iter().sum()
    }

    /// Number of plies that saw at least one simulation.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.visited.len()
    }
}

impl fmt::Display for MctsStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Max depth: {}", self.max_depth())?;
        writeln!(f, "Nodes count {}:", self.total_created())?;
        for (depth, count) in self.created.iter().enumerate().skip(1) {
            writeln!(f, "{depth}: {count}")?;
        }
        writeln!(f, "Visited nodes count {}:", self.total_visited())?;
        for (depth, count) in self.visited.iter().enumerate().skip(1) {
            writeln!(f, "{depth}: {count}")?;
        }
        Ok(())
    }
}
