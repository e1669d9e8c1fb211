use std::time::Duration;

use thiserror::Error;

/// Failure of a single simulated wait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The deliberate failure outcome. Carries the drawn duration in ms.
    #[error("rejected after {0} ms")]
    Rejected(u64),

    #[error("wait cancelled before its timer fired")]
    Cancelled,

    #[error("deadline of {0:?} elapsed")]
    DeadlineElapsed(Duration),

    /// A background unit stopped without settling its result.
    #[error("background unit ended without settling")]
    Abandoned,
}

impl WaitError {
    /// Duration carried by a simulated failure.
    pub fn duration_ms(&self) -> Option<u64> {
        match self {
            WaitError::Rejected(ms) => Some(*ms),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no example selected, set N to one of 1..={0}")]
    MissingSelector(usize),

    #[error("{0} is not defined")]
    UnknownExample(String),

    #[error("{name}() panicked: {message}")]
    Panicked { name: String, message: String },

    #[error("invalid example registry: {0}")]
    InvalidRegistry(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },

    #[error("unknown wait strategy {0:?}, expected \"notify\" or \"poll\"")]
    UnknownStrategy(String),
}
