//! Error types for solver operations.

use thiserror::Error;
use wt_core::error::WtError;

/// Errors that can occur during a bounded search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Root not bracketed: f({a}) = {fa}, f({b}) = {fb}")]
    NoSignChange { a: f64, b: f64, fa: f64, fb: f64 },

    #[error("Invalid bracket: [{lo}, {hi}]")]
    InvalidBracket { lo: f64, hi: f64 },

    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<WtError> for SolverError {
    fn from(e: WtError) -> Self {
        SolverError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<SolverError> for WtError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::NoSignChange { .. } => WtError::InvalidArg {
                what: "root not bracketed",
            },
            SolverError::InvalidBracket { .. } => WtError::InvalidArg { what: "bracket" },
            SolverError::ProblemSetup { .. } => WtError::InvalidArg {
                what: "problem setup",
            },
            SolverError::Backend { .. } => WtError::InvalidArg { what: "backend" },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SolverError::NoSignChange {
            a: 0.0,
            b: 1.0,
            fa: 1.0,
            fb: 2.0,
        };
        assert!(err.to_string().contains("not bracketed"));
    }

    #[test]
    fn error_conversion() {
        let err = SolverError::InvalidBracket { lo: 2.0, hi: 1.0 };
        let wt: WtError = err.into();
        assert!(matches!(wt, WtError::InvalidArg { .. }));
    }
}
