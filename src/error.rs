// Scheduling errors
// All variants are construction/registration-time failures: once a track
// is accepted into the Conductor, per-tick logic cannot fail.

use thiserror::Error;

/// Errors raised while building tracks or registering them with a Conductor
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid time expression '{0}'")]
    InvalidTimeExpression(String),

    #[error("voice '{0}' is not ready")]
    VoiceNotReady(String),

    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("invalid note name '{0}'")]
    InvalidNoteName(String),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
