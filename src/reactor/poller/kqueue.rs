use super::Token;
use crate::error::{Error, Result};
use crate::reactor::interest::Interest;

use libc::{
    ENOENT, EV_ADD, EV_CLEAR, EV_DELETE, EV_ENABLE, EV_ERROR, EV_ONESHOT, EV_RECEIPT,
    EVFILT_READ, EVFILT_WRITE, c_int, kevent, kqueue,
};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;

pub(crate) struct Poller {
    kqueue: OwnedFd,
    events: Vec<kevent>,
}

impl Poller {
    pub(crate) fn new(max_events: usize) -> Result<Self> {
        let mut events = Vec::new();
        events.try_reserve_exact(max_events)?;

        let fd = unsafe { kqueue() };
        if fd < 0 {
            return Err(Error::ReactorCreate(io::Error::last_os_error()));
        }

        // SAFETY: `fd` was just returned by kqueue() and nothing else owns it.
        let kqueue = unsafe { OwnedFd::from_raw_fd(fd) };

        Ok(Self { kqueue, events })
    }

    /// kqueue treats `EV_ADD` on an existing filter as an update, so unlike
    /// epoll this never reports `AlreadyExists`.
    pub(crate) fn add(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        let mut changes = Vec::with_capacity(2);

        if interest.is_readable() {
            changes.push(change(fd, EVFILT_READ, arm_flags(interest), token));
        }
        if interest.is_writable() {
            changes.push(change(fd, EVFILT_WRITE, arm_flags(interest), token));
        }

        first_error(self.submit(&mut changes)?, &[])
    }

    pub(crate) fn modify(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        let read = if interest.is_readable() { arm_flags(interest) } else { EV_DELETE };
        let write = if interest.is_writable() { arm_flags(interest) } else { EV_DELETE };

        let mut changes = vec![
            change(fd, EVFILT_READ, read, token),
            change(fd, EVFILT_WRITE, write, token),
        ];

        // Deleting a filter that was never armed is fine here.
        first_error(self.submit(&mut changes)?, &[ENOENT])
    }

    pub(crate) fn delete(&self, fd: RawFd) -> io::Result<()> {
        let token = Token::new(fd, 0);
        let mut changes = vec![
            change(fd, EVFILT_READ, EV_DELETE, token),
            change(fd, EVFILT_WRITE, EV_DELETE, token),
        ];

        let errors = self.submit(&mut changes)?;

        // Only one of the two filters may have been armed.
        if errors.iter().all(|&errno| errno == ENOENT) {
            return Err(io::Error::from_raw_os_error(ENOENT));
        }

        first_error(errors, &[ENOENT])
    }

    /// Blocks until at least one event is ready, restarting on `EINTR`.
    pub(crate) fn wait(&mut self, ready: &mut Vec<Token>) -> io::Result<()> {
        ready.clear();

        let max_events = self.events.capacity().min(c_int::MAX as usize) as c_int;
        let n_events = loop {
            let res = unsafe {
                kevent(
                    self.kqueue.as_raw_fd(),
                    ptr::null(),
                    0,
                    self.events.as_mut_ptr(),
                    max_events,
                    ptr::null(),
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

        // SAFETY: kevent initialised the first `n_events` entries, and
        // `n_events <= max_events <= capacity`.
        unsafe { self.events.set_len(n_events) };

        ready.extend(
            self.events
                .iter()
                .map(|event| Token::from_raw(event.udata as usize as u64)),
        );
        self.events.clear();

        Ok(())
    }

    // Applies `changes` with EV_RECEIPT and returns one errno per change (0 on success).
    fn submit(&self, changes: &mut [kevent]) -> io::Result<Vec<c_int>> {
        for event in changes.iter_mut() {
            event.flags |= EV_RECEIPT;
        }

        let res = unsafe {
            kevent(
                self.kqueue.as_raw_fd(),
                changes.as_ptr(),
                changes.len() as c_int,
                changes.as_mut_ptr(),
                changes.len() as c_int,
                ptr::null(),
            )
        };

        if res < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(changes[..res as usize]
            .iter()
            .map(|event| {
                if event.flags & EV_ERROR != 0 {
                    event.data as c_int
                } else {
                    0
                }
            })
            .collect())
    }
}

fn change(fd: RawFd, filter: i16, flags: u16, token: Token) -> kevent {
    kevent {
        ident: fd as usize,
        filter,
        flags,
        fflags: 0,
        data: 0,
        udata: token.as_raw() as usize as *mut _,
    }
}

fn arm_flags(interest: Interest) -> u16 {
    let mut flags = EV_ADD | EV_ENABLE;

    if interest.is_edge() {
        flags |= EV_CLEAR;
    }
    if interest.is_oneshot() {
        flags |= EV_ONESHOT;
    }

    flags
}

fn first_error(errors: Vec<c_int>, ignored: &[c_int]) -> io::Result<()> {
    match errors
        .into_iter()
        .find(|&errno| errno != 0 && !ignored.contains(&errno))
    {
        Some(errno) => Err(io::Error::from_raw_os_error(errno)),
        None => Ok(()),
    }
}
