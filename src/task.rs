//! Running engines on background threads and interrupting them after a time
//! limit.
//!
//! Engines poll a shared [`StopSignal`] between units of work, so stopping is
//! cooperative: [`run_tasks_and_wait`] only returns after every task observed
//! the request and returned from [`Task::run`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::resolver::Playout;
use crate::search::{Mcts, Minimax, RootSummary};

/// Interval between two checks of the running tasks.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Shared flag that asks a running search to finish early. Clones refer to the
/// same flag.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Creates a signal that is not requested yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every holder of the signal to stop.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once a stop was requested and not reset since.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clears the request so that the search can be started again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A search that can be executed on a separate thread and interrupted
/// through its [`StopSignal`].
pub trait Task: Send {
    /// Runs until completion or until a stop is requested.
    fn run(&mut self);

    /// Handle to the flag observed by [`Task::run`].
    fn stop_signal(&self) -> StopSignal;

    /// Asks the running task to return as soon as possible.
    fn request_stop(&self) {
        self.stop_signal().request_stop();
    }
}

/// Runs a single search of a [`Minimax`] engine, such as
/// [`crate::search::AlphaBeta`] or [`crate::search::BoundedMinimax`]. The
/// result is `None` until the search completes, and stays `None` if it was
/// interrupted.
#[derive(Debug)]
pub struct MinimaxTask<E: Minimax> {
    engine: E,
    state: E::State,
    result: Option<E::Move>,
}

impl<E: Minimax> MinimaxTask<E> {
    /// Prepares a search of `state`. Nothing runs until [`Task::run`].
    #[must_use]
    pub const fn new(engine: E, state: E::State) -> Self {
        Self {
            engine,
            state,
            result: None,
        }
    }

    /// Best move found by the last completed search.
    #[must_use]
    pub const fn result(&self) -> Option<&E::Move> {
        self.result.as_ref()
    }

    /// Wrapped engine, e.g. to read its statistics after the run.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E> Task for MinimaxTask<E>
where
    E: Minimax + Send,
    E::State: Send,
    E::Move: Send,
{
    fn run(&mut self) {
        self.result = self.engine.find_solution(&self.state);
    }

    fn stop_signal(&self) -> StopSignal {
        self.engine.stop_signal()
    }
}

/// Keeps iterating an [`Mcts`] tree until a stop is requested. The best move
/// is available at any time.
pub struct MctsTask<R: Playout> {
    engine: Mcts<R>,
    stop: StopSignal,
}

impl<R: Playout> fmt::Debug for MctsTask<R>
where
    Mcts<R>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MctsTask")
            .field("engine", &self.engine)
            .field("stop", &self.stop)
            .finish()
    }
}

impl<R: Playout> MctsTask<R> {
    /// Wraps a tree that may already contain iterations of earlier runs.
    #[must_use]
    pub fn new(engine: Mcts<R>) -> Self {
        Self {
            engine,
            stop: StopSignal::new(),
        }
    }

    /// Most visited root move so far.
    #[must_use]
    pub fn best_move(&self) -> Option<R::Move> {
        self.engine.best_move()
    }

    /// Visit counts of the root moves, to be merged with other searches.
    #[must_use]
    pub fn summary(&self) -> RootSummary<R::Move> {
        self.engine.summary()
    }

    /// Wrapped engine.
    #[must_use]
    pub const fn engine(&self) -> &Mcts<R> {
        &self.engine
    }
}

impl<R> Task for MctsTask<R>
where
    R: Playout + Send,
    R::State: Send,
    R::Move: Send,
{
    fn run(&mut self) {
        while !self.stop.is_requested() {
            self.engine.iterate();
        }
    }

    fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }
}

/// Runs every task on its own thread, waits until all of them finish or
/// `waiting_time` elapses, then requests them to stop and joins the threads.
///
/// A panic inside a task is propagated to the caller once all threads are
/// joined.
pub fn run_tasks_and_wait(tasks: &mut [&mut dyn Task], waiting_time: Duration) {
    let deadline = Instant::now() + waiting_time;
    let signals: Vec<StopSignal> = tasks.iter().map(|task| task.stop_signal()).collect();

    thread::scope(|scope| {
        let handles: Vec<_> = tasks
            .iter_mut()
            .map(|task| scope.spawn(move || task.run()))
            .collect();

        while !handles.iter().all(thread::ScopedJoinHandle::is_finished) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            thread::sleep(POLL_INTERVAL.min(remaining));
        }

        debug!(tasks = signals.len(), "stopping tasks");
        for signal in &signals {
            signal.request_stop();
        }

        let mut panic = None;
        for handle in handles {
            if let Err(payload) = handle.join() {
                panic = Some(payload);
            }
        }
        if let Some(payload) = panic {
            std::panic::resume_unwind(payload);
        }
    });
}
