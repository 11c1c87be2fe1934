//! Scheduling state shared between the executor and its wakers.
//!
//! The executor owns the only strong handle; wakers and the thread-local spawn
//! context hold weak ones. Every `RefCell` borrow taken here ends before the
//! method returns, so wakes and spawns issued from inside `progress` or from
//! inside the reactor's poll never observe an outstanding borrow.

use crate::error::{Error, Result};
use crate::runtime::queue::{Push, RunQueue};
use crate::task::{TaskId, TaskRef};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub(crate) struct Scheduler {
    queue: RefCell<RunQueue>,
    active: RefCell<HashMap<TaskId, TaskRef>>,
    wakes: Cell<u64>,
    dropped: Cell<u64>,
}

impl Scheduler {
    pub(crate) fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            queue: RefCell::new(RunQueue::new(capacity)?),
            active: RefCell::new(HashMap::new()),
            wakes: Cell::new(0),
            dropped: Cell::new(0),
        })
    }

    /// Starts tracking `task` and queues it.
    ///
    /// Spawning an already active task does nothing, whichever executor it is
    /// active on, so a task sits in at most one census. When the queue is full
    /// the task stays active without being queued and `QueueOverflow` is
    /// returned.
    pub(crate) fn spawn(&self, task: &TaskRef) -> Result<()> {
        if task.is_active() {
            tracing::trace!(task = %task.id(), "spawn ignored, task already active");
            return Ok(());
        }

        {
            let mut active = self.active.borrow_mut();
            active.try_reserve(1)?;
            active.insert(task.id(), task.clone());
        }
        task.set_active(true);

        let mut queue = self.queue.borrow_mut();
        match queue.push(task.clone()) {
            Push::Queued | Push::Duplicate => {
                tracing::trace!(task = %task.id(), "spawned");
                Ok(())
            }
            Push::Full => {
                self.dropped.set(self.dropped.get() + 1);
                tracing::warn!(
                    task = %task.id(),
                    capacity = queue.capacity(),
                    "run queue full, spawned task left active but unqueued"
                );
                Err(Error::QueueOverflow {
                    capacity: queue.capacity(),
                })
            }
        }
    }

    /// Re-queues a task active on this scheduler that is not already queued.
    ///
    /// The task's own active flag is not enough: it may have completed here
    /// and been respawned on another executor since the waker was made.
    pub(crate) fn wake(&self, task: &TaskRef) {
        if !self.owns(task) {
            tracing::trace!(task = %task.id(), "stale wake ignored");
            return;
        }

        let mut queue = self.queue.borrow_mut();
        match queue.push(task.clone()) {
            Push::Queued => {
                self.wakes.set(self.wakes.get() + 1);
                tracing::trace!(task = %task.id(), "woken");
            }
            Push::Duplicate => {}
            Push::Full => {
                self.dropped.set(self.dropped.get() + 1);
                tracing::warn!(
                    task = %task.id(),
                    capacity = queue.capacity(),
                    "run queue full, wake dropped"
                );
            }
        }
    }

    /// Marks `task` inactive and stops tracking it.
    ///
    /// A task may have woken itself before reporting a terminal state, so it
    /// is also dropped from the live queue.
    pub(crate) fn retire(&self, task: &TaskRef) {
        task.set_active(false);
        self.queue.borrow_mut().remove(task.id());
        self.active.borrow_mut().remove(&task.id());
    }

    /// Returns `true` if `task` is in this scheduler's active census.
    pub(crate) fn owns(&self, task: &TaskRef) -> bool {
        self.active
            .borrow()
            .get(&task.id())
            .is_some_and(|tracked| Rc::ptr_eq(tracked, task))
    }

    pub(crate) fn take_batch(&self, batch: &mut Vec<TaskRef>) {
        self.queue.borrow_mut().take_into(batch);
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active.borrow().len()
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.borrow().len()
    }

    pub(crate) fn has_queued(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    pub(crate) fn is_queued(&self, id: TaskId) -> bool {
        self.queue.borrow().contains(id)
    }

    pub(crate) fn wakes(&self) -> u64 {
        self.wakes.get()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.get()
    }

    /// Forgets every task, marking each one inactive.
    pub(crate) fn shutdown(&self) {
        let queued = self.queue.borrow_mut().take_all();
        drop(queued);

        let active = std::mem::take(&mut *self.active.borrow_mut());
        for task in active.into_values() {
            task.set_active(false);
        }
    }
}
