use super::Token;
use crate::error::{Error, Result};
use crate::reactor::interest::Interest;

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD, EPOLLET, EPOLLIN, EPOLLONESHOT,
    EPOLLOUT, c_int, epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

pub(crate) struct Poller {
    epoll: OwnedFd,
    events: Vec<epoll_event>,
}

impl Poller {
    pub(crate) fn new(max_events: usize) -> Result<Self> {
        let mut events = Vec::new();
        events.try_reserve_exact(max_events)?;

        let fd = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if fd < 0 {
            return Err(Error::ReactorCreate(io::Error::last_os_error()));
        }

        // SAFETY: `fd` was just returned by epoll_create1 and nothing else owns it.
        let epoll = unsafe { OwnedFd::from_raw_fd(fd) };

        Ok(Self { epoll, events })
    }

    pub(crate) fn add(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_ADD, fd, token, interest)
    }

    pub(crate) fn modify(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_MOD, fd, token, interest)
    }

    pub(crate) fn delete(&self, fd: RawFd) -> io::Result<()> {
        // Kernels before 2.6.9 reject a null event pointer even for EPOLL_CTL_DEL.
        let mut event = epoll_event { events: 0, u64: 0 };

        let res = unsafe { epoll_ctl(self.epoll.as_raw_fd(), EPOLL_CTL_DEL, fd, &mut event) };
        if res < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    /// Blocks until at least one event is ready, restarting on `EINTR`.
    pub(crate) fn wait(&mut self, ready: &mut Vec<Token>) -> io::Result<()> {
        ready.clear();

        let max_events = self.events.capacity().min(c_int::MAX as usize) as c_int;
        let n_events = loop {
            let res = unsafe {
                epoll_wait(
                    self.epoll.as_raw_fd(),
                    self.events.as_mut_ptr(),
                    max_events,
                    -1,
                )
            };

            if res >= 0 {
                break res as usize;
            }

            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        };

        // SAFETY: epoll_wait initialised the first `n_events` entries, and
        // `n_events <= max_events <= capacity`.
        unsafe { self.events.set_len(n_events) };

        ready.extend(self.events.iter().map(|event| {
            let raw = event.u64;
            Token::from_raw(raw)
        }));
        self.events.clear();

        Ok(())
    }

    fn ctl(&self, op: c_int, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        let mut event = epoll_event {
            events: epoll_flags(interest),
            u64: token.as_raw(),
        };

        let res = unsafe { epoll_ctl(self.epoll.as_raw_fd(), op, fd, &mut event) };
        if res < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }
}

fn epoll_flags(interest: Interest) -> u32 {
    let mut flags = 0;

    if interest.is_readable() {
        flags |= EPOLLIN as u32;
    }
    if interest.is_writable() {
        flags |= EPOLLOUT as u32;
    }
    if interest.is_edge() {
        flags |= EPOLLET as u32;
    }
    if interest.is_oneshot() {
        flags |= EPOLLONESHOT as u32;
    }

    flags
}
