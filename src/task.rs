//! Tasks and the contract every schedulable computation implements.
//!
//! A [`Progress`] implementation is a resumable unit of work. The executor
//! never owns the computation outright: callers wrap it in a [`Task`], keep a
//! [`TaskRef`] handle, and hand that handle to
//! [`Executor::spawn`](crate::Executor::spawn). The executor holds its own
//! strong handle only while the task is active.
//!
//! # How Tasks Work
//!
//! 1. A computation is wrapped in a [`Task`] with [`Task::new`]
//! 2. The task is spawned: it becomes active and is queued
//! 3. The executor calls [`Progress::progress`] with the reactor and a [`Waker`]
//! 4. On [`FutureState::Pending`] the computation must already have arranged a
//!    wake-up, usually by registering a descriptor with the reactor
//! 5. When the descriptor becomes ready the reactor invokes the waker, which
//!    re-queues the task
//! 6. On [`FutureState::Completed`] or [`FutureState::Failed`] the task becomes
//!    inactive and is never polled again
//!
//! # Example
//!
//! ```
//! use readyloop::{Executor, FutureState, Task, progress_fn};
//!
//! let mut executor = Executor::new(16)?;
//! let task = Task::new(progress_fn(|_reactor, _waker| FutureState::Completed));
//!
//! executor.spawn(&task)?;
//! executor.run()?;
//!
//! assert!(!task.is_active());
//! # Ok::<(), readyloop::Error>(())
//! ```

use crate::reactor::Reactor;
use crate::runtime::Waker;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Result of a single [`Progress::progress`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FutureState {
    /// Not finished. A wake-up must already be arranged.
    Pending,
    /// Finished successfully. Terminal.
    Completed,
    /// Finished with an error. Terminal.
    Failed,
}

impl FutureState {
    /// Returns `true` for [`Completed`](Self::Completed) and [`Failed`](Self::Failed).
    pub fn is_terminal(self) -> bool {
        !matches!(self, FutureState::Pending)
    }
}

/// A resumable computation driven by the [`Executor`](crate::Executor).
///
/// `progress` is only called while the owning task is active. Returning
/// [`FutureState::Pending`] without having arranged for `waker` (or a clone of
/// it) to be invoked later leaves the task stuck forever, and
/// [`Executor::run`](crate::Executor::run) will never return.
///
/// Closures with the matching signature implement this trait.
pub trait Progress {
    /// Advances the computation as far as it can go without blocking.
    fn progress(&mut self, reactor: &mut Reactor, waker: &Waker) -> FutureState;
}

impl<F> Progress for F
where
    F: FnMut(&mut Reactor, &Waker) -> FutureState,
{
    fn progress(&mut self, reactor: &mut Reactor, waker: &Waker) -> FutureState {
        self(reactor, waker)
    }
}

/// Pins down the closure signature so that argument types need no annotations.
///
/// ```
/// use readyloop::{FutureState, Task, progress_fn};
///
/// let task = Task::new(progress_fn(|_reactor, waker| {
///     waker.wake_by_ref();
///     FutureState::Pending
/// }));
/// assert!(!task.is_active());
/// ```
pub fn progress_fn<F>(f: F) -> F
where
    F: FnMut(&mut Reactor, &Waker) -> FutureState,
{
    f
}

/// Process-unique identity of a [`Task`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Shared handle to a [`Task`].
pub type TaskRef = Rc<Task>;

/// A spawned-or-spawnable computation together with its scheduling flag.
///
/// Created with [`Task::new`], which returns a [`TaskRef`]. The same handle can
/// be spawned again once the task has reached a terminal state.
pub struct Task {
    id: TaskId,
    active: Cell<bool>,
    future: RefCell<Box<dyn Progress>>,
}

impl Task {
    /// Wraps `future` in a new, inactive task.
    pub fn new<P>(future: P) -> TaskRef
    where
        P: Progress + 'static,
    {
        Rc::new(Task {
            id: TaskId::next(),
            active: Cell::new(false),
            future: RefCell::new(Box::new(future)),
        })
    }

    /// Returns this task's identity.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns `true` while an executor tracks this task.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    /// Calls [`Progress::progress`] on the wrapped computation.
    ///
    /// The run loop never has two batches in flight and never queues a task
    /// twice, so the future is never borrowed re-entrantly.
    pub(crate) fn progress(&self, reactor: &mut Reactor, waker: &Waker) -> FutureState {
        self.future.borrow_mut().progress(reactor, waker)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish_non_exhaustive()
    }
}
