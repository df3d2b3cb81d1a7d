//! Strongly typed identifier wrappers.
//!
//! Signal groups and traffic lights are named by configuration strings.  The
//! integer ids here are runtime handles: a group's position inside its
//! controller, and the token that ties scheduled events to one controller
//! instance.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Position of a signal group inside its controller's group list.
    pub struct GroupIndex(u32);
}

typed_id! {
    /// Identity of one controller instance for event routing.
    ///
    /// Every constructed or cloned controller draws a fresh token, so events
    /// scheduled by a superseded instance can be recognised and dropped.
    pub struct RunToken(u64);
}

static NEXT_RUN_TOKEN: AtomicU64 = AtomicU64::new(1);

impl RunToken {
    /// Allocate a token never handed out before in this process.
    pub fn fresh() -> RunToken {
        RunToken(NEXT_RUN_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}
