//! Bounded run queue of tasks awaiting a `progress` call.
//!
//! The queue never holds the same task twice and never grows past the capacity
//! fixed at construction. Both buffers (the live queue and the batch being
//! drained) are reserved up front, so draining never allocates.

use crate::error::Result;
use crate::task::{TaskId, TaskRef};

/// Outcome of [`RunQueue::push`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Push {
    Queued,
    Duplicate,
    Full,
}

pub(crate) struct RunQueue {
    tasks: Vec<TaskRef>,
    capacity: usize,
}

impl RunQueue {
    pub(crate) fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            tasks: reserve(capacity)?,
            capacity,
        })
    }

    /// Appends `task` unless it is already queued or the queue is full.
    pub(crate) fn push(&mut self, task: TaskRef) -> Push {
        if self.contains(task.id()) {
            return Push::Duplicate;
        }

        if self.tasks.len() >= self.capacity {
            return Push::Full;
        }

        self.tasks.push(task);
        Push::Queued
    }

    /// Drops `id` from the queue if present.
    pub(crate) fn remove(&mut self, id: TaskId) {
        self.tasks.retain(|task| task.id() != id);
    }

    pub(crate) fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id() == id)
    }

    /// Moves every queued task into `batch`, leaving the live queue empty.
    ///
    /// `batch` must be empty. The two buffers are swapped, so the live queue
    /// keeps a reserved allocation.
    pub(crate) fn take_into(&mut self, batch: &mut Vec<TaskRef>) {
        debug_assert!(batch.is_empty());
        std::mem::swap(&mut self.tasks, batch);
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Empties the queue, handing the tasks back so they drop outside any borrow.
    pub(crate) fn take_all(&mut self) -> Vec<TaskRef> {
        std::mem::take(&mut self.tasks)
    }
}

/// Reserves an empty buffer able to hold a full queue.
pub(crate) fn reserve(capacity: usize) -> Result<Vec<TaskRef>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(capacity)?;

    Ok(buffer)
}
