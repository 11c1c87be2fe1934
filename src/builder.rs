//! Fluent builder for Executor construction.
//!
//! Provides a builder pattern interface for creating and configuring Executor instances.

use crate::error::{Error, Result};
use crate::reactor::core::MAX_EVENTS;
use crate::runtime::Executor;

/// Default bound on the run queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Builder for constructing Executor instances with fluent API.
///
/// # Example
/// ```
/// use readyloop::ExecutorBuilder;
///
/// let executor = ExecutorBuilder::new()
///     .queue_capacity(256)
///     .max_events(32)
///     .build()?;
///
/// assert_eq!(executor.active_count(), 0);
/// # Ok::<(), readyloop::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct ExecutorBuilder {
    queue_capacity: usize,
    max_events: usize,
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorBuilder {
    /// Creates a builder with the default queue capacity and event buffer.
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_events: MAX_EVENTS,
        }
    }

    /// Sets the maximum number of tasks the run queue can hold.
    ///
    /// Spawns and wakes beyond this bound are dropped (see
    /// [`Error::QueueOverflow`]).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets how many readiness events a single reactor poll can collect.
    pub fn max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Builds and returns a configured Executor instance.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] for a zero queue capacity or event buffer,
    /// [`Error::Allocation`] when the queues cannot be reserved, and
    /// [`Error::ReactorCreate`] when the OS multiplexer cannot be created.
    /// Nothing acquired before the failure is leaked.
    pub fn build(self) -> Result<Executor> {
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue capacity must be greater than 0"));
        }

        if self.max_events == 0 {
            return Err(Error::InvalidConfig("max events must be greater than 0"));
        }

        Executor::with_config(self.queue_capacity, self.max_events)
    }
}
