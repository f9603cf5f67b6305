//! Bounded numerical search routines for the rotor solvers.
//!
//! Every routine here terminates within a fixed iteration cap and reports its
//! best estimate together with a `converged` flag. Only a root bracket that
//! does not change sign is reported as an error, so callers can fall back to
//! minimizing the absolute residual.

pub mod error;
pub mod jacobian;
pub mod newton;
pub mod scalar;

pub use error::{SolverError, SolverResult};
pub use jacobian::{central_difference_jacobian, finite_difference_jacobian};
pub use newton::{BoxBounds, NewtonConfig, NewtonResult, newton_solve_bounded};
pub use scalar::{
    BracketConfig, ScalarMin, ScalarRoot, brentq, maximize_bounded, minimize_bounded,
};
