//! `Scheduler`: the "run this later" primitive the control layer relies on.

use sig_core::{Duration, SimTime};

use crate::{ScheduleError, ScheduleResult};

/// A discrete-event clock that accepts future events of type `E`.
///
/// # Contract
///
/// - Events are delivered in non-decreasing time order.
/// - Events sharing a time are delivered one at a time, in a deterministic
///   order.
/// - `now()` equals the time of the event currently being delivered.
pub trait Scheduler<E> {
    /// Current simulation time.
    fn now(&self) -> SimTime;

    /// Deliver `event` at absolute time `at`.
    ///
    /// Fails with [`ScheduleError::InPast`] if `at` is before `now()`.
    fn schedule_at(&mut self, at: SimTime, event: E) -> ScheduleResult<()>;

    /// Deliver `event` after `delay` has elapsed from `now()`.
    fn schedule_after(&mut self, delay: Duration, event: E) -> ScheduleResult<()> {
        if !delay.0.is_finite() || delay.0 < 0.0 {
            return Err(ScheduleError::InvalidDelay(delay));
        }
        let at = self.now() + delay;
        self.schedule_at(at, event)
    }
}
