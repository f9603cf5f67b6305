//! Error types for oracle evaluations.

use thiserror::Error;
use wt_core::error::WtError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AeroError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Input arrays differ in length: {what} ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type AeroResult<T> = Result<T, AeroError>;

impl From<WtError> for AeroError {
    fn from(e: WtError) -> Self {
        match e {
            WtError::NonFinite { what, .. } => AeroError::NonPhysical { what },
            WtError::LengthMismatch { what, left, right } => {
                AeroError::LengthMismatch { what, left, right }
            }
            WtError::InvalidArg { what } | WtError::Invariant { what } => {
                AeroError::InvalidArg { what }
            }
        }
    }
}

impl From<AeroError> for WtError {
    fn from(e: AeroError) -> Self {
        match e {
            AeroError::NonPhysical { what } => WtError::InvalidArg { what },
            AeroError::LengthMismatch { what, left, right } => {
                WtError::LengthMismatch { what, left, right }
            }
            AeroError::InvalidArg { what } => WtError::InvalidArg { what },
        }
    }
}
