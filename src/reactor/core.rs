use crate::error::{Error, Result};
use crate::reactor::interest::Interest;
use crate::reactor::poller::{Poller, Token};
use crate::runtime::Waker;

use std::collections::HashMap;
use std::io;
use std::os::fd::RawFd;

/// Maximum number of events collected per blocking wait.
pub(crate) const MAX_EVENTS: usize = 64;

struct Registration {
    interest: Interest,
    generation: u32,
    waker: Waker,
}

/// Readiness multiplexer shared by every task of one executor.
///
/// Holds at most one registration per descriptor. Each registration owns a
/// copy of the [`Waker`] it was registered with; re-registering a descriptor
/// replaces that copy, and unregistering it (or dropping the reactor) releases
/// it. The kernel only ever sees a small token (descriptor plus generation)
/// for a registration, never a pointer.
///
/// Futures reach the reactor through the `reactor` argument of
/// [`Progress::progress`](crate::Progress::progress).
pub struct Reactor {
    registry: HashMap<RawFd, Registration>,
    ready: Vec<Token>,
    next_generation: u32,
    poller: Poller,
}

impl Reactor {
    pub(crate) fn new(max_events: usize) -> Result<Self> {
        let poller = Poller::new(max_events)?;

        let mut ready = Vec::new();
        ready.try_reserve_exact(max_events)?;

        Ok(Self {
            registry: HashMap::new(),
            ready,
            next_generation: 0,
            poller,
        })
    }

    /// Asks to be woken through `waker` once `fd` is ready for `interest`.
    ///
    /// Registering a descriptor that is already registered modifies its
    /// interest and replaces the stored waker; the previous waker is released.
    ///
    /// # Errors
    ///
    /// [`Error::Registration`] when the OS rejects the descriptor or interest,
    /// or when `interest` asks for neither readable nor writable readiness.
    /// [`Error::Allocation`] when registry storage cannot be reserved.
    pub fn register(&mut self, fd: RawFd, interest: Interest, waker: &Waker) -> Result<()> {
        tracing::debug!(fd, ?interest, task = %waker.task_id(), "registering");

        if !interest.is_readable() && !interest.is_writable() {
            return Err(Error::Registration {
                fd,
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "interest must include readable or writable",
                ),
            });
        }

        let waker = waker.clone();
        self.registry.try_reserve(1)?;

        let generation = self.next_generation;
        let token = Token::new(fd, generation);

        let res = if self.registry.contains_key(&fd) {
            match self.poller.modify(fd, token, interest) {
                // closed and reopened behind our back, the kernel forgot it
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    self.poller.add(fd, token, interest)
                }
                res => res,
            }
        } else {
            match self.poller.add(fd, token, interest) {
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::trace!(fd, "already known to the multiplexer, modifying");
                    self.poller.modify(fd, token, interest)
                }
                res => res,
            }
        };
        res.map_err(|source| Error::Registration { fd, source })?;

        self.next_generation = self.next_generation.wrapping_add(1);
        let previous = self.registry.insert(
            fd,
            Registration {
                interest,
                generation,
                waker,
            },
        );

        if let Some(previous) = previous {
            tracing::trace!(fd, task = %previous.waker.task_id(), "replaced previous waker");
        }

        Ok(())
    }

    /// Stops watching `fd` and releases its stored waker.
    ///
    /// The registration record is dropped once the OS call returns, whatever
    /// its outcome: removal only fails when the kernel holds no interest in
    /// the descriptor anyway (`EBADF`, `ENOENT`).
    ///
    /// # Errors
    ///
    /// [`Error::Unregistration`] when the OS removal fails.
    pub fn unregister(&mut self, fd: RawFd) -> Result<()> {
        tracing::debug!(fd, "unregistering");

        let res = self.poller.delete(fd);
        self.registry.remove(&fd);

        res.map_err(|source| Error::Unregistration { fd, source })
    }

    /// Returns `true` if `fd` currently has a registration.
    pub fn is_registered(&self, fd: RawFd) -> bool {
        self.registry.contains_key(&fd)
    }

    /// Interest of the current registration for `fd`, if any.
    pub fn interest(&self, fd: RawFd) -> Option<Interest> {
        self.registry.get(&fd).map(|registration| registration.interest)
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if no descriptor is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Blocks until at least one registered descriptor is ready, then wakes
    /// the waker registered for each ready descriptor.
    ///
    /// Events are dispatched in the order the OS reports them. An event whose
    /// token no longer matches a live registration is discarded. Returns the
    /// number of wakers invoked.
    pub(crate) fn poll(&mut self) -> Result<usize> {
        tracing::debug!(registered = self.registry.len(), "polling");

        self.poller.wait(&mut self.ready).map_err(Error::Poll)?;

        let mut woken = 0;
        for token in &self.ready {
            match self.registry.get(&token.fd()) {
                Some(registration) if registration.generation == token.generation() => {
                    registration.waker.wake_by_ref();
                    woken += 1;
                }
                _ => {
                    tracing::trace!(fd = token.fd(), "discarding event for stale registration");
                }
            }
        }

        tracing::debug!(events = self.ready.len(), woken, "poll returned");

        Ok(woken)
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        // Registrations (and their wakers) go first; the poller closes its
        // handle when the fields drop afterwards.
        self.registry.clear();
    }
}
