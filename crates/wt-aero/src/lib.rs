//! wt-aero: the aerodynamic oracle contract for rotor performance work.
//!
//! The power-curve and table generators never look inside the rotor model.
//! They only call an [`AeroOracle`], which maps
//! `{wind speed, rotor speed, pitch}` to `{power, thrust, torque, root moment}`
//! and, on request, the matching dimensionless coefficients.
//!
//! [`ParametricRotor`] is a closed-form oracle with a smooth Cp(λ, β) surface.
//! It stands in for a full blade-element-momentum code in tests and in the CLI.
//!
//! # Example
//!
//! ```
//! use wt_aero::{AeroOracle, ParametricRotor};
//!
//! let rotor = ParametricRotor::reference_5mw();
//! let s = rotor.evaluate_point(10.0, 11.0, 0.0).unwrap();
//! assert!(s.loads.power > 0.0);
//! ```

pub mod error;
pub mod oracle;
pub mod parametric;

pub use error::{AeroError, AeroResult};
pub use oracle::{AeroCoefficients, AeroLoads, AeroOracle, AeroSample, SpanwiseLoads};
pub use parametric::{CpSurface, ParametricRotor};
