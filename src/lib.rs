//! Minimal single-threaded cooperative runtime built on OS readiness polling.
//!
//! An [`Executor`] drives [`Task`]s by calling [`Progress::progress`] on them.
//! A task that cannot finish yet registers a descriptor with the executor's
//! [`Reactor`], attaching the [`Waker`] it was given, and returns
//! [`FutureState::Pending`]. When nothing is runnable the executor blocks in
//! the reactor; ready descriptors invoke their wakers, which re-queue the
//! tasks, and the loop continues until no task is active.
//!
//! # Architecture
//!
//! - **Executor**: bounded run queue plus the census of active tasks
//! - **Reactor**: epoll/kqueue handle plus a registry of one waker per descriptor
//! - **Waker**: (executor, task) identity pair used to re-queue a task
//! - **Task**: shared wrapper around a [`Progress`] implementation
//! - **ExecutorBuilder**: fluent configuration of queue and event buffer sizes
//!
//! # Example
//!
//! ```
//! use readyloop::{Executor, FutureState, Interest, Task, progress_fn};
//!
//! let mut fds = [0; 2];
//! assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
//! let (read_fd, write_fd) = (fds[0], fds[1]);
//!
//! let mut registered = false;
//! let reader = Task::new(progress_fn(move |reactor, waker| {
//!     if !registered {
//!         registered = true;
//!         return match reactor.register(read_fd, Interest::READABLE, waker) {
//!             Ok(()) => FutureState::Pending,
//!             Err(_) => FutureState::Failed,
//!         };
//!     }
//!     let _ = reactor.unregister(read_fd);
//!     FutureState::Completed
//! }));
//!
//! let mut executor = Executor::new(16)?;
//! executor.spawn(&reader)?;
//!
//! assert_eq!(unsafe { libc::write(write_fd, b"x".as_ptr().cast(), 1) }, 1);
//! executor.run()?;
//!
//! assert_eq!(executor.stats().reactor_polls, 1);
//! # unsafe { libc::close(read_fd); libc::close(write_fd); }
//! # Ok::<(), readyloop::Error>(())
//! ```

mod builder;
mod error;
mod reactor;
mod runtime;
mod task;

pub use builder::{DEFAULT_QUEUE_CAPACITY, ExecutorBuilder};
pub use error::{Error, Result};
pub use reactor::{Interest, Reactor};
pub use runtime::{Executor, Phase, Stats, Waker, spawn};
pub use task::{FutureState, Progress, Task, TaskId, TaskRef, progress_fn};
