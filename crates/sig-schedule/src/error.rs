use sig_core::{Duration, SimTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("cannot schedule at {at}: clock is already at {now}")]
    InPast { at: SimTime, now: SimTime },

    #[error("cannot schedule after a negative or non-finite delay {0}")]
    InvalidDelay(Duration),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
