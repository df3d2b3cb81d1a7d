use sig_control::ControlError;
use sig_schedule::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("controller id {0:?} is registered more than once")]
    DuplicateController(String),

    #[error("controller error: {0}")]
    Control(#[from] ControlError),

    #[error("scheduling error: {0}")]
    Schedule(#[from] ScheduleError),
}

pub type SimResult<T> = Result<T, SimError>;
