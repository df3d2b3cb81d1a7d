use thiserror::Error;

use sig_core::{CoreError, Duration, GroupIndex};
use sig_schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("controller {controller}: invalid cycle time: {source}")]
    CycleTime {
        controller: String,
        #[source]
        source:     CoreError,
    },

    #[error("{owner}: {what} must be finite, got {value}")]
    NonFinite {
        owner: String,
        what:  &'static str,
        value: f64,
    },

    #[error("signal group {group}: {phase} duration may not be negative, got {value}")]
    NegativeDuration {
        group: String,
        phase: &'static str,
        value: f64,
    },

    #[error("signal group {group}: cycle time {cycle} is shorter than the sum of non-red times by {excess}")]
    CycleTooShort {
        group:  String,
        cycle:  Duration,
        excess: Duration,
    },

    #[error("signal group {group}: traffic light ids may not be empty")]
    EmptyTrafficLights { group: String },

    #[error("signal group id {0:?} is used more than once")]
    DuplicateGroup(String),

    #[error("traffic light {light:?} of signal group {group} could not be found")]
    UnknownTrafficLight { group: String, light: String },

    #[error("controller {0} has already been started")]
    AlreadyStarted(String),

    #[error("controller {0} has not been started")]
    NotStarted(String),

    #[error("controller {controller} has no signal group at {group}")]
    UnknownGroup { controller: String, group: GroupIndex },

    #[error("scheduling failed: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("timing plan parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ControlResult<T> = Result<T, ControlError>;
