//! Platform readiness multiplexers.
//!
//! Each backend exposes the same crate-private `Poller` type:
//!
//! - `new(max_events)` creates the OS handle
//! - `add` / `modify` / `delete` manage interest in one descriptor
//! - `wait` blocks until at least one event is ready and collects their tokens
//!
//! `add` reports an already registered descriptor as
//! [`io::ErrorKind::AlreadyExists`](std::io::ErrorKind::AlreadyExists) so the
//! reactor can fall back to `modify`.

#[cfg(target_os = "linux")]
mod epoll;
#[cfg(target_os = "linux")]
pub(crate) use epoll::Poller;

#[cfg(any(target_os = "macos", target_os = "ios"))]
mod kqueue;
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(crate) use kqueue::Poller;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "ios")))]
compile_error!("readyloop supports epoll (Linux) and kqueue (macOS, iOS) only");

use std::os::fd::RawFd;

/// Kernel user data attached to a registration.
///
/// Packs the descriptor with the generation of the registration that armed it,
/// so an event raised for an older registration of the same descriptor can be
/// recognised and discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Token(u64);

impl Token {
    pub(crate) fn new(fd: RawFd, generation: u32) -> Self {
        Token((u64::from(generation) << 32) | u64::from(fd as u32))
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Token(raw)
    }

    pub(crate) fn as_raw(self) -> u64 {
        self.0
    }

    pub(crate) fn fd(self) -> RawFd {
        self.0 as u32 as RawFd
    }

    pub(crate) fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::Token;

    #[test]
    fn token_packs_fd_and_generation() {
        let token = Token::new(17, 3);

        assert_eq!(token.fd(), 17);
        assert_eq!(token.generation(), 3);
        assert_eq!(Token::from_raw(token.as_raw()), token);
    }
}
