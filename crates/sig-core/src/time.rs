//! Simulation time model.
//!
//! # Design
//!
//! Time is continuous and measured in seconds.  Two wrappers keep absolute
//! instants and spans apart:
//!
//!   `SimTime` : an absolute instant on the simulation clock
//!   `Duration`: a signed span between instants
//!
//! Signal timing is cyclic.  Offsets may be negative or exceed the cycle, so
//! every use goes through [`Duration::rem_cycle`], which folds a span into
//! `[0, cycle)`:
//!
//! ```text
//! in_cycle = (now - origin - offset) mod cycle
//! ```
//!
//! `SimTime` is totally ordered through `f64::total_cmp` so it can key a
//! `BTreeMap` in the event queue.  Callers are expected to feed finite values;
//! the control layer validates every configured duration before use.

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

use crate::{CoreError, CoreResult};

/// Slack used when a derived duration lands a hair below zero through float
/// round-off.  Values within this distance of zero are treated as zero.
pub const TIME_EPSILON: f64 = 1e-9;

// ── Duration ──────────────────────────────────────────────────────────────────

/// A signed span of simulation time in seconds.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Duration(pub f64);

impl Duration {
    pub const ZERO: Duration = Duration(0.0);

    #[inline]
    pub const fn from_secs(secs: f64) -> Duration {
        Duration(secs)
    }

    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// `true` for spans of zero or less.
    #[inline]
    pub fn is_non_positive(self) -> bool {
        self.0 <= 0.0
    }

    /// Return `self` unchanged if it is finite, otherwise a `NonFinite` error
    /// naming `what`.
    pub fn finite(self, what: &'static str) -> CoreResult<Duration> {
        if self.0.is_finite() {
            Ok(self)
        } else {
            Err(CoreError::NonFinite { what, value: self.0 })
        }
    }

    /// Fold this span into `[0, cycle)`.
    ///
    /// `f64::rem_euclid` can return exactly `cycle` for tiny negative inputs;
    /// that result is mapped back to zero so the half-open range holds.
    pub fn rem_cycle(self, cycle: Duration) -> Duration {
        let r = self.0.rem_euclid(cycle.0);
        if r >= cycle.0 { Duration::ZERO } else { Duration(r) }
    }

    /// Forward distance from cycle position `from` to cycle position `to`,
    /// in `[0, cycle)`.
    pub fn cyclic_distance(from: Duration, to: Duration, cycle: Duration) -> Duration {
        (to - from).rem_cycle(cycle)
    }

    /// Clamp spans in `(-TIME_EPSILON, 0)` to exactly zero.
    pub fn snap_to_zero(self) -> Duration {
        if self.0 < 0.0 && self.0 > -TIME_EPSILON { Duration::ZERO } else { self }
    }

    pub fn max(self, other: Duration) -> Duration {
        if other.0 > self.0 { other } else { self }
    }
}

impl Add for Duration {
    type Output = Duration;
    #[inline]
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Duration;
    #[inline]
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Neg for Duration {
    type Output = Duration;
    #[inline]
    fn neg(self) -> Duration {
        Duration(-self.0)
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Duration {
        iter.fold(Duration::ZERO, Add::add)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulation instant in seconds since the start of the run.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub const fn from_secs(secs: f64) -> SimTime {
        SimTime(secs)
    }

    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Span elapsed since the simulation origin.
    #[inline]
    pub fn since_origin(self) -> Duration {
        Duration(self.0)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl Sub for SimTime {
    type Output = Duration;
    #[inline]
    fn sub(self, rhs: SimTime) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}s", self.0)
    }
}

// ── Cycle validation ──────────────────────────────────────────────────────────

/// Check that `cycle` is a usable cycle length: finite and strictly positive.
pub fn validate_cycle(cycle: Duration) -> CoreResult<Duration> {
    let cycle = cycle.finite("cycle time")?;
    if cycle.is_non_positive() {
        return Err(CoreError::NonPositive { what: "cycle time", value: cycle.0 });
    }
    Ok(cycle)
}
