//! Game-agnostic tree search engines: [alpha-beta negamax](search::AlphaBeta),
//! [minimax over a bounded tree](search::BoundedMinimax) and
//! [Monte Carlo Tree Search](search::Mcts). For more information, see
//! [README].
//!
//! Games plug in by implementing the traits of the [`resolver`] module. Long
//! searches can be run on background threads and interrupted through the
//! [`task`] module.
//!
//! [README]: https://github.com/kirillbobyrev/treesearch/blob/main/README.md

pub mod arena;
pub mod resolver;
pub mod search;
pub mod task;

pub use resolver::{Playout, Resolver, StaticEvaluation};
pub use search::{AlphaBeta, BoundedMinimax, Config, Mcts, Minimax};
pub use task::{run_tasks_and_wait, MctsTask, MinimaxTask, StopSignal, Task};
