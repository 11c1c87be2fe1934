//! Interest flags for descriptor readiness.

use std::fmt;
use std::ops::BitOr;

/// Readiness a registration asks the OS multiplexer to report.
///
/// Flags combine with `|`:
///
/// ```
/// use readyloop::Interest;
///
/// let interest = Interest::READABLE | Interest::EDGE;
/// assert!(interest.is_readable());
/// assert!(interest.is_edge());
/// assert!(!interest.is_writable());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interest(u8);

impl Interest {
    /// Report when the descriptor can be read without blocking.
    pub const READABLE: Interest = Interest(0b0001);
    /// Report when the descriptor can be written without blocking.
    pub const WRITABLE: Interest = Interest(0b0010);
    /// Edge-triggered: report transitions only, not every poll while ready.
    pub const EDGE: Interest = Interest(0b0100);
    /// Disarm after the first report until the descriptor is registered again.
    pub const ONESHOT: Interest = Interest(0b1000);

    /// Readable and writable.
    pub const fn both() -> Self {
        Interest(Self::READABLE.0 | Self::WRITABLE.0)
    }

    /// Returns `true` if the readable flag is set.
    pub const fn is_readable(self) -> bool {
        self.0 & Self::READABLE.0 != 0
    }

    /// Returns `true` if the writable flag is set.
    pub const fn is_writable(self) -> bool {
        self.0 & Self::WRITABLE.0 != 0
    }

    /// Returns `true` if the edge-triggered flag is set.
    pub const fn is_edge(self) -> bool {
        self.0 & Self::EDGE.0 != 0
    }

    /// Returns `true` if the one-shot flag is set.
    pub const fn is_oneshot(self) -> bool {
        self.0 & Self::ONESHOT.0 != 0
    }

    /// Combines interests.
    pub const fn add(self, other: Interest) -> Self {
        Interest(self.0 | other.0)
    }

    /// Removes interest.
    pub const fn remove(self, other: Interest) -> Self {
        Interest(self.0 & !other.0)
    }
}

impl BitOr for Interest {
    type Output = Interest;

    fn bitor(self, other: Interest) -> Interest {
        self.add(other)
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.is_readable(), "READABLE"),
            (self.is_writable(), "WRITABLE"),
            (self.is_edge(), "EDGE"),
            (self.is_oneshot(), "ONESHOT"),
        ];

        let mut first = true;
        for (_, name) in flags.iter().filter(|(set, _)| *set) {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }

        if first {
            f.write_str("(empty)")?;
        }

        Ok(())
    }
}
