//! Interest and readiness flag sets.
//!
//! [`Interest`] is what a stream asks the multiplexer to watch for,
//! [`Readiness`] is what the multiplexer reports back. The interest mask of a
//! registered descriptor lives in an [`InterestHandle`] shared by the stream
//! and the multiplexer: the stream flips write interest on and off in place,
//! the multiplexer reads the current mask before every poll.

use std::cell::Cell;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;

/// Set of readiness conditions a descriptor is monitored for.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interest(u8);

impl Interest {
    pub const NONE: Interest = Interest(0);
    pub const READABLE: Interest = Interest(0b01);
    pub const WRITABLE: Interest = Interest(0b10);
    pub const BOTH: Interest = Interest(0b11);

    #[inline]
    pub const fn contains(self, other: Interest) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_readable(self) -> bool {
        self.contains(Self::READABLE)
    }

    #[inline]
    pub const fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    #[inline]
    pub const fn add(self, other: Interest) -> Interest {
        Interest(self.0 | other.0)
    }

    #[inline]
    pub const fn remove(self, other: Interest) -> Interest {
        Interest(self.0 & !other.0)
    }
}

impl BitOr for Interest {
    type Output = Interest;

    fn bitor(self, rhs: Interest) -> Interest {
        self.add(rhs)
    }
}

impl BitOrAssign for Interest {
    fn bitor_assign(&mut self, rhs: Interest) {
        *self = self.add(rhs);
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_readable(), self.is_writable()) {
            (false, false) => write!(f, "Interest(NONE)"),
            (true, false) => write!(f, "Interest(READABLE)"),
            (false, true) => write!(f, "Interest(WRITABLE)"),
            (true, true) => write!(f, "Interest(READABLE | WRITABLE)"),
        }
    }
}

/// Readiness conditions reported by a multiplexer for one descriptor.
///
/// Hangup and error conditions are reported regardless of the interest mask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Readiness(u8);

impl Readiness {
    pub const EMPTY: Readiness = Readiness(0);
    pub const READABLE: Readiness = Readiness(0b0_0001);
    pub const WRITABLE: Readiness = Readiness(0b0_0010);
    /// Peer closed its side of the channel.
    pub const HANGUP: Readiness = Readiness(0b0_0100);
    /// An error condition is pending on the descriptor.
    pub const ERROR: Readiness = Readiness(0b0_1000);
    /// The descriptor is not open.
    pub const INVALID: Readiness = Readiness(0b1_0000);

    #[inline]
    pub const fn contains(self, other: Readiness) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_readable(self) -> bool {
        self.contains(Self::READABLE)
    }

    #[inline]
    pub const fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    #[inline]
    pub const fn is_hangup(self) -> bool {
        self.contains(Self::HANGUP)
    }

    /// True for both pending-error and invalid-descriptor conditions.
    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 & (Self::ERROR.0 | Self::INVALID.0) != 0
    }

    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.contains(Self::INVALID)
    }
}

impl BitOr for Readiness {
    type Output = Readiness;

    fn bitor(self, rhs: Readiness) -> Readiness {
        Readiness(self.0 | rhs.0)
    }
}

impl BitOrAssign for Readiness {
    fn bitor_assign(&mut self, rhs: Readiness) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Readiness, &str); 5] = [
            (Readiness::READABLE, "READABLE"),
            (Readiness::WRITABLE, "WRITABLE"),
            (Readiness::HANGUP, "HANGUP"),
            (Readiness::ERROR, "ERROR"),
            (Readiness::INVALID, "INVALID"),
        ];

        write!(f, "Readiness(")?;
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        if first {
            write!(f, "EMPTY")?;
        }
        write!(f, ")")
    }
}

/// Interest mask of one registration, shared between a stream and its multiplexer.
///
/// Cloning yields another handle to the same mask.
#[derive(Clone, Default)]
pub struct InterestHandle(Rc<Cell<Interest>>);

impl InterestHandle {
    pub fn new(initial: Interest) -> Self {
        Self(Rc::new(Cell::new(initial)))
    }

    /// Current interest mask.
    #[inline]
    pub fn get(&self) -> Interest {
        self.0.get()
    }

    #[inline]
    pub fn enable(&self, interest: Interest) {
        self.0.set(self.0.get().add(interest));
    }

    #[inline]
    pub fn disable(&self, interest: Interest) {
        self.0.set(self.0.get().remove(interest));
    }

    /// Stop watching for anything.
    #[inline]
    pub fn clear(&self) {
        self.0.set(Interest::NONE);
    }
}

impl fmt::Debug for InterestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}
