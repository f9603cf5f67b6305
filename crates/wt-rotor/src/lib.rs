//! wt-rotor: rotor performance on top of an aerodynamic oracle.
//!
//! - [`drivetrain`]: shaft to electrical power (polynomial or table)
//! - [`powercurve`]: the regulated power-curve solver
//! - [`tables`]: Cp/Ct/Cq tables for controller design
//! - [`aep`] and [`distribution`]: annual energy production
//! - [`stall`]: spanwise stall margin

pub mod aep;
pub mod distribution;
pub mod drivetrain;
pub mod error;
pub mod powercurve;
pub mod stall;
pub mod tables;

pub use aep::{AepIntegrator, aep};
pub use distribution::{WindDistribution, power_law_shear};
pub use drivetrain::{DrivetrainModel, DrivetrainType, EfficiencyTable, TableType};
pub use error::{RotorError, RotorResult};
pub use powercurve::{
    ControlLimits, OperatingPoint, PowerCurve, PowerCurveOptions, PowerCurveSolver,
    RatedConditions, Region, RegionBoundaries,
};
pub use stall::no_stall_constraint;
pub use tables::{CoefficientTables, TableGrid, generate as generate_tables};
