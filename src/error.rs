//! Crate-wide error type.
//!
//! Every failure in the core is fatal for the run that raised it: there are no
//! retries anywhere. The variants mirror the places a run can go wrong, from
//! construction through validation to restart.

use crate::component::Category;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CouplingError>;

/// The domain dimension a mismatch was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Time,
    Space,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Time => write!(f, "time"),
            Dimension::Space => write!(f, "space"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CouplingError {
    /// Malformed or inconsistent construction parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{dimension} domain mismatch between {first} and {second} components: {reason}")]
    DomainMismatch {
        first: Category,
        second: Category,
        dimension: Dimension,
        reason: String,
    },

    /// An inward with no producer, or an outward produced twice.
    #[error("exchange contract error: {component} component, field '{field}': {reason}")]
    ExchangeContract {
        component: Category,
        field: String,
        reason: String,
    },

    /// Missing or malformed driving/ancillary values.
    #[error("data error: {0}")]
    Data(String),

    /// Restart state incompatible with the component it is restored into.
    #[error("dump error: {0}")]
    Dump(String),

    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },
}

impl CouplingError {
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        CouplingError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
