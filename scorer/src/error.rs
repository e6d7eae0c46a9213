// scorer/src/error.rs
//
// Error taxonomy for the scoring engine.
//
// Parameter and lookup failures abort a single (scenario, tier) pair only;
// the batch runner records them as skipped pairs via `ErrorKind` and keeps
// going.  Numerical degeneracy in the independence analyzer is reported and
// downgraded to an empty result by the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScorerError>;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown tier: {0}")]
    UnknownTier(String),

    #[error("scenario not found: {0}")]
    NotFound(String),

    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    #[error("external service failed after {attempts} attempts: {last}")]
    ExternalExhausted { attempts: u32, last: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializable discriminant of `ScorerError`, recorded in the summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidParameter,
    UnknownTier,
    NotFound,
    NumericalDegeneracy,
    ExternalExhausted,
    Io,
    Json,
}

impl ScorerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter(_)       => ErrorKind::InvalidParameter,
            Self::UnknownTier(_)            => ErrorKind::UnknownTier,
            Self::NotFound(_)               => ErrorKind::NotFound,
            Self::NumericalDegeneracy(_)    => ErrorKind::NumericalDegeneracy,
            Self::ExternalExhausted { .. }  => ErrorKind::ExternalExhausted,
            Self::Io(_)                     => ErrorKind::Io,
            Self::Json(_)                   => ErrorKind::Json,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter    => write!(f, "INVALID_PARAMETER"),
            Self::UnknownTier         => write!(f, "UNKNOWN_TIER"),
            Self::NotFound            => write!(f, "NOT_FOUND"),
            Self::NumericalDegeneracy => write!(f, "NUMERICAL_DEGENERACY"),
            Self::ExternalExhausted   => write!(f, "EXTERNAL_EXHAUSTED"),
            Self::Io                  => write!(f, "IO"),
            Self::Json                => write!(f, "JSON"),
        }
    }
}
