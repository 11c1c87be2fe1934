//! Waker handed to every `progress` call.
//!
//! A waker is an identity pair: the executor that created it and the task it
//! re-schedules. It owns neither, so a waker stored in the reactor (or anywhere
//! else) can outlive the task's activity, the task itself, or even the
//! executor. Waking in any of those cases does nothing.

use crate::runtime::scheduler::Scheduler;
use crate::task::{Task, TaskId};

use std::fmt;
use std::rc::{Rc, Weak};

/// Handle that re-queues one task on one executor.
///
/// Obtained as the `waker` argument of
/// [`Progress::progress`](crate::Progress::progress) or from
/// [`Executor::waker`](crate::Executor::waker). Clones are interchangeable.
#[derive(Clone)]
pub struct Waker {
    scheduler: Weak<Scheduler>,
    task: Weak<Task>,
    id: TaskId,
}

impl Waker {
    pub(crate) fn new(scheduler: &Rc<Scheduler>, task: &Rc<Task>) -> Self {
        Self {
            scheduler: Rc::downgrade(scheduler),
            task: Rc::downgrade(task),
            id: task.id(),
        }
    }

    /// Wakes the task, consuming this waker.
    pub fn wake(self) {
        self.wake_by_ref();
    }

    /// Wakes the task without consuming this waker.
    ///
    /// The task is queued for its next `progress` call unless it is no longer
    /// active, is already queued, or the run queue is full.
    pub fn wake_by_ref(&self) {
        let (Some(scheduler), Some(task)) = (self.scheduler.upgrade(), self.task.upgrade()) else {
            tracing::trace!(task = %self.id, "wake ignored, executor or task gone");
            return;
        };

        scheduler.wake(&task);
    }

    /// Identity of the task this waker re-schedules.
    pub fn task_id(&self) -> TaskId {
        self.id
    }

    /// Returns `true` if both wakers target the same task on the same executor.
    pub fn will_wake(&self, other: &Waker) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.scheduler, &other.scheduler)
    }
}

impl fmt::Debug for Waker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waker").field("task", &self.id).finish()
    }
}
