//! wt-windfield: TurbSim binary full-field (`.bts`) files.
//!
//! Little-endian layout:
//!
//! ```text
//! i16 format tag
//! i32 nz, ny, ntwr, nt
//! f32 dz, dy, dt, mean wind speed, hub height, grid bottom height
//! 3 × (f32 slope, f32 offset)            u, v, w scaling
//! i32 description length, then that many ASCII bytes
//! nt × { 3·ny·nz i16 grid values, 3·ntwr i16 tower values }
//! ```
//!
//! Grid values are stored component-fastest, then y, then z, and decode as
//! `(raw - offset) / slope`.

pub mod error;
pub mod turbsim;

pub use error::{WindFieldError, WindFieldResult};
pub use turbsim::{BtsHeader, ComponentScaling, MAX_DESCRIPTION, WindField};
