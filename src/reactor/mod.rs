//! Event-driven readiness reactor.
//!
//! This module wraps the OS readiness multiplexer:
//! - [`core`]: the [`Reactor`] and its descriptor registry
//! - [`interest`]: readiness flags requested at registration
//! - [`poller`]: epoll (Linux) and kqueue (macOS) backends

pub(crate) mod core;
pub(crate) mod interest;
pub(crate) mod poller;

pub use self::core::Reactor;
pub use interest::Interest;
