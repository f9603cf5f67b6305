//! wt-core: shared foundation for the wind turbine crates.
//!
//! Contains:
//! - units (uom SI types + constructors, rpm conversions)
//! - numeric (Real + tolerances + smoothed float helpers)
//! - interp (grids, linear interpolation, trapezoid rule, PCHIP spline)
//! - error (shared error types)

pub mod error;
pub mod interp;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{WtError, WtResult};
pub use interp::*;
pub use numeric::*;
pub use units::*;
