//! Error type shared by the executor and the reactor.

use std::collections::TryReserveError;
use std::io;
use std::os::fd::RawFd;

/// Errors reported by the runtime.
///
/// Failures are always local to the call that produced them: the runtime never
/// retries an operation and has no global error channel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Storage for the run queue, a batch or a registration could not be reserved.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// The OS readiness multiplexer could not be created.
    #[error("failed to create reactor: {0}")]
    ReactorCreate(#[source] io::Error),

    /// The OS rejected adding or modifying interest in a descriptor.
    #[error("failed to register fd {fd}: {source}")]
    Registration {
        fd: RawFd,
        #[source]
        source: io::Error,
    },

    /// The OS rejected removing interest in a descriptor.
    #[error("failed to unregister fd {fd}: {source}")]
    Unregistration {
        fd: RawFd,
        #[source]
        source: io::Error,
    },

    /// The blocking readiness wait failed.
    #[error("reactor poll failed: {0}")]
    Poll(#[source] io::Error),

    /// A task was spawned while the run queue was full.
    ///
    /// The task is left active but is not queued, so nothing will poll it
    /// until something wakes it.
    #[error("run queue is full ({capacity} tasks), spawned task was not queued")]
    QueueOverflow { capacity: usize },

    /// [`spawn`](crate::spawn) was called outside of a running executor.
    #[error("spawn() called outside of a running executor")]
    NoRuntime,

    /// The builder was given a configuration it cannot honour.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
