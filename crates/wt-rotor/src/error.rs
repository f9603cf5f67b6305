//! Error types for rotor performance calculations.

use thiserror::Error;
use wt_aero::AeroError;
use wt_core::error::WtError;
use wt_solver::SolverError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotorError {
    #[error("Aerodynamic oracle error: {0}")]
    Aero(#[from] AeroError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Numeric error: {0}")]
    Core(#[from] WtError),

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid drivetrain table: {what}")]
    InvalidTable { what: String },

    #[error("Unknown {kind}: {name}")]
    UnknownVariant { kind: &'static str, name: String },
}

pub type RotorResult<T> = Result<T, RotorError>;

/// Oracle failures surfacing inside a solver objective.
impl From<RotorError> for SolverError {
    fn from(e: RotorError) -> Self {
        match e {
            RotorError::Solver(inner) => inner,
            other => SolverError::Backend {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RotorError::UnknownVariant {
            kind: "drivetrain type",
            name: "HYDRAULIC".into(),
        };
        assert_eq!(err.to_string(), "Unknown drivetrain type: HYDRAULIC");
    }

    #[test]
    fn oracle_errors_wrap() {
        let err: RotorError = AeroError::InvalidArg { what: "x" }.into();
        assert!(matches!(err, RotorError::Aero(_)));
        let solver: SolverError = err.into();
        assert!(matches!(solver, SolverError::Backend { .. }));
    }
}
