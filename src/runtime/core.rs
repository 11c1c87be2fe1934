//! Single-threaded executor that drives tasks to completion.
//!
//! The executor alternates between two phases. While the run queue holds work
//! it is *draining*: the queue is swapped out into a batch and every task in
//! the batch gets one `progress` call. Once the queue is empty but tasks are
//! still active it is *blocked* in the reactor's poll, which refills the queue
//! through wakers. With nothing queued and nothing active it is *done*.

use crate::builder::ExecutorBuilder;
use crate::error::Result;
use crate::reactor::Reactor;
use crate::runtime::queue::reserve;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::{Waker, enter_context};
use crate::task::{FutureState, TaskRef};

use std::fmt;
use std::rc::Rc;

/// Step performed by [`Executor::turn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// One batch of queued tasks was polled.
    Draining,
    /// The executor blocked in the reactor until descriptors became ready.
    Blocked,
    /// Nothing was queued and no task is active.
    Done,
}

/// Counters describing an executor's work so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Batches drained.
    pub batches: u64,
    /// `progress` calls made.
    pub progress_calls: u64,
    /// Times the executor blocked in the reactor.
    pub reactor_polls: u64,
    /// Wakes that queued a task.
    pub wakes: u64,
    /// Spawns and wakes dropped because the run queue was full.
    pub dropped: u64,
}

/// Current-thread executor paired with its own [`Reactor`].
///
/// # Example
///
/// ```
/// use readyloop::{Executor, FutureState, Task, progress_fn};
///
/// let mut executor = Executor::new(64)?;
///
/// let mut yielded = false;
/// let task = Task::new(progress_fn(move |_reactor, waker| {
///     if yielded {
///         return FutureState::Completed;
///     }
///     yielded = true;
///     waker.wake_by_ref();
///     FutureState::Pending
/// }));
///
/// executor.spawn(&task)?;
/// executor.run()?;
///
/// assert_eq!(executor.stats().progress_calls, 2);
/// assert_eq!(executor.active_count(), 0);
/// # Ok::<(), readyloop::Error>(())
/// ```
pub struct Executor {
    scheduler: Rc<Scheduler>,
    batch: Vec<TaskRef>,
    reactor: Reactor,
    batches: u64,
    progress_calls: u64,
    reactor_polls: u64,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("batches", &self.batches)
            .field("progress_calls", &self.progress_calls)
            .field("reactor_polls", &self.reactor_polls)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Creates an executor whose run queue holds at most `queue_capacity` tasks.
    ///
    /// Shorthand for `ExecutorBuilder::new().queue_capacity(n).build()`.
    pub fn new(queue_capacity: usize) -> Result<Self> {
        ExecutorBuilder::new().queue_capacity(queue_capacity).build()
    }

    /// Returns a builder for configuring an executor.
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    pub(crate) fn with_config(queue_capacity: usize, max_events: usize) -> Result<Self> {
        let scheduler = Rc::new(Scheduler::new(queue_capacity)?);
        let batch = reserve(queue_capacity)?;
        let reactor = Reactor::new(max_events)?;

        Ok(Self {
            scheduler,
            batch,
            reactor,
            batches: 0,
            progress_calls: 0,
            reactor_polls: 0,
        })
    }

    /// Starts tracking `task` and queues it for its first `progress` call.
    ///
    /// Spawning a task that is already active does nothing.
    ///
    /// # Errors
    ///
    /// [`Error::QueueOverflow`](crate::Error::QueueOverflow) when the run queue
    /// is full. The task is then active but unqueued and will only run once
    /// something wakes it.
    pub fn spawn(&self, task: &TaskRef) -> Result<()> {
        self.scheduler.spawn(task)
    }

    /// Builds a waker that re-queues `task` on this executor.
    pub fn waker(&self, task: &TaskRef) -> Waker {
        Waker::new(&self.scheduler, task)
    }

    /// Runs until no task is queued or active.
    ///
    /// Blocks in the reactor whenever tasks are active but none is runnable.
    /// A task that returns [`FutureState::Pending`] without arranging a wake
    /// keeps this call blocked forever.
    pub fn run(&mut self) -> Result<()> {
        tracing::debug!(active = self.active_count(), "executor starting");

        while self.turn()? != Phase::Done {}

        tracing::debug!(stats = ?self.stats(), "executor finished");

        Ok(())
    }

    /// Performs a single step of the run loop and reports which one it was.
    pub fn turn(&mut self) -> Result<Phase> {
        if self.scheduler.has_queued() {
            self.drain();
            return Ok(Phase::Draining);
        }

        if self.scheduler.active_count() == 0 {
            return Ok(Phase::Done);
        }

        if self.reactor.is_empty() {
            tracing::warn!(
                active = self.scheduler.active_count(),
                "blocking with active tasks but no registered descriptors"
            );
        }

        self.reactor_polls += 1;
        self.reactor.poll()?;

        Ok(Phase::Blocked)
    }

    // Polls every task queued at the start of the batch exactly once. Wakes
    // raised meanwhile land in the emptied live queue, i.e. the next batch.
    fn drain(&mut self) {
        self.scheduler.take_batch(&mut self.batch);
        self.batches += 1;

        tracing::trace!(size = self.batch.len(), "draining batch");

        let scheduler = &self.scheduler;
        let reactor = &mut self.reactor;
        let progress_calls = &mut self.progress_calls;

        enter_context(scheduler, || {
            for task in self.batch.drain(..) {
                if !scheduler.owns(&task) {
                    continue;
                }

                let waker = Waker::new(scheduler, &task);
                let state = task.progress(reactor, &waker);
                *progress_calls += 1;

                tracing::trace!(task = %task.id(), ?state, "progressed");

                if state.is_terminal() {
                    if state == FutureState::Failed {
                        tracing::debug!(task = %task.id(), "task failed");
                    }
                    scheduler.retire(&task);
                }
            }
        });
    }

    /// Number of spawned tasks that have not reached a terminal state.
    pub fn active_count(&self) -> usize {
        self.scheduler.active_count()
    }

    /// Number of tasks waiting in the run queue.
    pub fn queued(&self) -> usize {
        self.scheduler.queued()
    }

    /// Returns `true` if `task` is waiting in the run queue.
    pub fn is_queued(&self, task: &TaskRef) -> bool {
        self.scheduler.is_queued(task.id())
    }

    /// The reactor owned by this executor.
    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    /// Snapshot of this executor's counters.
    pub fn stats(&self) -> Stats {
        Stats {
            batches: self.batches,
            progress_calls: self.progress_calls,
            reactor_polls: self.reactor_polls,
            wakes: self.scheduler.wakes(),
            dropped: self.scheduler.dropped(),
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        // Leftover tasks become inactive so they can be spawned elsewhere.
        self.batch.clear();
        self.scheduler.shutdown();
    }
}
