//! `EventQueue`: sparse time-ordered event queue.
//!
//! Only instants with something to do occupy an entry, so a controller that
//! changes color every few tens of seconds costs nothing in between.
//!
//! # Performance note
//!
//! `BTreeMap` gives O(log W) insert and pop where W = number of distinct
//! pending instants.  A fixed-time intersection keeps one pending event per
//! signal group, so W is bounded by the group count.

use std::collections::{BTreeMap, VecDeque};

use sig_core::SimTime;

use crate::{ScheduleError, ScheduleResult, Scheduler};

/// A priority queue mapping simulation instants → events due at that instant.
pub struct EventQueue<E> {
    inner: BTreeMap<SimTime, VecDeque<E>>,
    now:   SimTime,
    /// Cached total event count for O(1) `len()`.
    total: usize,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    /// An empty queue with its clock at zero.
    pub fn new() -> Self {
        Self::starting_at(SimTime::ZERO)
    }

    /// An empty queue with its clock at `now`.
    pub fn starting_at(now: SimTime) -> Self {
        Self { inner: BTreeMap::new(), now, total: 0 }
    }

    /// Remove and return the earliest event, advancing the clock to its time.
    pub fn pop_next(&mut self) -> Option<(SimTime, E)> {
        let mut entry = self.inner.first_entry()?;
        let at = *entry.key();
        let event = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        let event = event?;
        self.total -= 1;
        self.now = at;
        Some((at, event))
    }

    /// Remove and return the earliest event only if it is due at or before
    /// `limit`.
    pub fn pop_until(&mut self, limit: SimTime) -> Option<(SimTime, E)> {
        match self.next_time() {
            Some(t) if t <= limit => self.pop_next(),
            _ => None,
        }
    }

    /// Move the clock forward to `time` without delivering anything.
    ///
    /// Has no effect if `time` is not later than the current clock or if an
    /// event is pending before `time`.
    pub fn advance_to(&mut self, time: SimTime) {
        let blocked = self.next_time().is_some_and(|t| t < time);
        if time > self.now && !blocked {
            self.now = time;
        }
    }

    /// The earliest instant with at least one pending event.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    /// Total number of pending events.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct future instants with at least one pending event.
    pub fn time_count(&self) -> usize {
        self.inner.len()
    }

    /// Drop every pending event for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        let mut total = 0;
        self.inner.retain(|_, events| {
            events.retain(&mut keep);
            total += events.len();
            !events.is_empty()
        });
        self.total = total;
    }
}

impl<E> Scheduler<E> for EventQueue<E> {
    fn now(&self) -> SimTime {
        self.now
    }

    fn schedule_at(&mut self, at: SimTime, event: E) -> ScheduleResult<()> {
        if at < self.now {
            return Err(ScheduleError::InPast { at, now: self.now });
        }
        self.inner.entry(at).or_default().push_back(event);
        self.total += 1;
        Ok(())
    }
}
