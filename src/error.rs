use thiserror::Error;

use crate::models::Instant;

/// Strict timestamp parser failure. Carries the offending input so the log
/// line is actionable without re-reading the config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampFormatError {
    #[error("{field} `{value}` does not match {expected}")]
    Pattern {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("{field} `{value}` is out of range")]
    OutOfRange { field: &'static str, value: String },
}

/// A single person's configuration could not be turned into a birth instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config for {name} (slot {slot}) is invalid: {source}")]
pub struct ConfigParseError {
    pub slot: usize,
    pub name: String,
    #[source]
    pub source: TimestampFormatError,
}

/// Fatal startup conditions. Only the primary person can produce these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("missing config for primary person {slot_name}: need {keys}")]
    MissingPrimary { slot_name: String, keys: String },
    #[error(transparent)]
    InvalidPrimary(#[from] ConfigParseError),
}

impl StartupError {
    /// First line of the fatal diagnostic screen.
    pub fn headline(&self) -> String {
        match self {
            Self::MissingPrimary { slot_name, .. } => {
                format!("FATAL: Missing config for {}", slot_name)
            }
            Self::InvalidPrimary(err) => format!("FATAL: Config Err for {}", err.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("current time {now} is before birth {birth}")]
    InvalidOrdering { birth: Instant, now: Instant },
    #[error("calendar borrow failed: {0}")]
    UnexpectedCalculation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeSyncError {
    #[error("network unavailable")]
    NoNetwork,
    #[error("time API error: {0}")]
    ApiError(String),
}

impl From<reqwest::Error> for TimeSyncError {
    fn from(value: reqwest::Error) -> Self {
        Self::ApiError(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("display write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("display not ready: {0}")]
    NotReady(String),
}

/// Anything that aborts one control loop cycle. Never escapes the loop.
#[derive(Debug, Error)]
pub enum LoopIterationError {
    #[error(transparent)]
    Screen(#[from] ScreenError),
    #[error("panic: {0}")]
    Panicked(String),
}
