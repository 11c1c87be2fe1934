//! Runtime subsystem modules.

pub(crate) mod context;
mod core;
pub(crate) mod queue;
pub(crate) mod scheduler;
pub(crate) mod waker;

pub(crate) use context::enter_context;
pub use context::spawn;
pub use self::core::{Executor, Phase, Stats};
pub use waker::Waker;
