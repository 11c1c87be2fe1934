//! Thread-local record of the executor currently draining a batch.
//!
//! While [`Executor::turn`](crate::Executor::turn) runs a batch it enters a
//! context holding a weak handle to its scheduler, which lets code running
//! inside `progress` spawn new tasks through the free [`spawn`] function
//! without holding a reference to the executor. The previous context is
//! restored on exit, including when `progress` panics.

use crate::error::{Error, Result};
use crate::runtime::scheduler::Scheduler;
use crate::task::TaskRef;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

thread_local! {
    /// Scheduler of the executor currently draining on this thread.
    static CURRENT_SCHEDULER: RefCell<Option<Weak<Scheduler>>> = const { RefCell::new(None) };
}

// Restores the previous context when dropped.
struct ContextGuard {
    previous: Option<Weak<Scheduler>>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_SCHEDULER.with(|current| *current.borrow_mut() = previous);
    }
}

/// Runs `function` with `scheduler` installed as the current context.
pub(crate) fn enter_context<F, R>(scheduler: &Rc<Scheduler>, function: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = CURRENT_SCHEDULER
        .with(|current| current.borrow_mut().replace(Rc::downgrade(scheduler)));
    let _guard = ContextGuard { previous };

    function()
}

/// Spawns `task` on the executor whose batch is currently running.
///
/// Behaves like [`Executor::spawn`](crate::Executor::spawn): spawning an
/// active task is a no-op, and a full run queue yields
/// [`Error::QueueOverflow`].
///
/// # Errors
///
/// Returns [`Error::NoRuntime`] when called outside of a `progress` call made
/// by a running executor.
pub fn spawn(task: &TaskRef) -> Result<()> {
    let scheduler = CURRENT_SCHEDULER
        .with(|current| current.borrow().as_ref().and_then(Weak::upgrade))
        .ok_or(Error::NoRuntime)?;

    scheduler.spawn(task)
}
