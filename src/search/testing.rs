//! Hand-written game trees for unit tests.

use std::cell::{Cell, OnceCell};

use crate::resolver::{Playout, Resolver, StaticEvaluation};
use crate::search::Score;
use crate::task::StopSignal;

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) value: Score,
    pub(crate) children: Vec<Node>,
}

pub(crate) const fn leaf(value: Score) -> Node {
    Node {
        value,
        children: Vec::new(),
    }
}

pub(crate) const fn node(value: Score, children: Vec<Node>) -> Node {
    Node { value, children }
}

/// The textbook alpha-beta example: the root maximizes over three minimizing
/// children.
pub(crate) fn textbook() -> Node {
    node(
        0.0,
        vec![
            node(0.0, vec![leaf(3.0), leaf(12.0), leaf(8.0)]),
            node(0.0, vec![leaf(2.0), leaf(4.0), leaf(6.0)]),
            node(0.0, vec![leaf(14.0), leaf(5.0), leaf(2.0)]),
        ],
    )
}

/// A game played on an explicit tree. States are paths of child indices from
/// the root; `evaluate` and `playout` both return the value stored in the
/// node.
#[derive(Clone, Debug)]
pub(crate) struct ExplicitTree {
    root: Node,
    pub(crate) playouts: Vec<Vec<usize>>,
}

impl ExplicitTree {
    pub(crate) const fn new(root: Node) -> Self {
        Self {
            root,
            playouts: Vec::new(),
        }
    }

    fn lookup(&self, path: &[usize]) -> &Node {
        path.iter()
            .fold(&self.root, |node, &index| &node.children[index])
    }
}

impl Resolver for ExplicitTree {
    type Move = usize;
    type Moves = Vec<usize>;
    type State = Vec<usize>;

    fn collect_moves(&self, state: &Self::State) -> Self::Moves {
        (0..self.lookup(state).children.len()).collect()
    }

    fn apply_move(&self, state: &mut Self::State, next_move: &Self::Move) {
        state.push(*next_move);
    }
}

impl StaticEvaluation for ExplicitTree {
    fn evaluate(&self, state: &Self::State) -> Score {
        self.lookup(state).value
    }
}

impl Playout for ExplicitTree {
    fn playout(&mut self, state: &Self::State) -> Score {
        self.playouts.push(state.clone());
        self.lookup(state).value
    }
}

/// Explicit tree that requests a stop of the search right after its
/// `stop_after`-th evaluation.
#[derive(Debug)]
pub(crate) struct InterruptingTree {
    tree: ExplicitTree,
    stop_after: usize,
    evaluations: Cell<usize>,
    stop: OnceCell<StopSignal>,
}

impl InterruptingTree {
    pub(crate) const fn new(root: Node, stop_after: usize) -> Self {
        Self {
            tree: ExplicitTree::new(root),
            stop_after,
            evaluations: Cell::new(0),
            stop: OnceCell::new(),
        }
    }

    /// Connects the tree to the signal of the engine that searches it.
    pub(crate) fn attach(&self, stop: StopSignal) {
        self.stop.set(stop).expect("signal is attached once");
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations.get()
    }
}

impl Resolver for InterruptingTree {
    type Move = usize;
    type Moves = Vec<usize>;
    type State = Vec<usize>;

    fn collect_moves(&self, state: &Self::State) -> Self::Moves {
        self.tree.collect_moves(state)
    }

    fn apply_move(&self, state: &mut Self::State, next_move: &Self::Move) {
        self.tree.apply_move(state, next_move);
    }
}

impl StaticEvaluation for InterruptingTree {
    fn evaluate(&self, state: &Self::State) -> Score {
        self.evaluations.set(self.evaluations.get() + 1);
        if self.evaluations.get() == self.stop_after {
            if let Some(stop) = self.stop.get() {
                stop.request_stop();
            }
        }
        self.tree.evaluate(state)
    }
}
