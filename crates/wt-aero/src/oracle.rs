//! The aerodynamic oracle contract.

use crate::error::{AeroError, AeroResult};
use serde::{Deserialize, Serialize};
use wt_core::numeric::ensure_finite;

/// Dimensional rotor loads (SI: W, N, N·m, N·m).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AeroLoads {
    pub power: f64,
    pub thrust: f64,
    pub torque: f64,
    /// Blade root flapwise moment
    pub moment: f64,
}

/// Dimensionless power, thrust, torque and moment coefficients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AeroCoefficients {
    pub cp: f64,
    pub ct: f64,
    pub cq: f64,
    pub cm: f64,
}

/// One oracle evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AeroSample {
    pub loads: AeroLoads,
    /// Present when coefficients were requested
    pub coefficients: Option<AeroCoefficients>,
}

/// Spanwise distributions at a single operating point.
///
/// Angles are in degrees. All vectors share the length of `r`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanwiseLoads {
    /// Station radius (m)
    pub r: Vec<f64>,
    /// Axial induction factor
    pub a: Vec<f64>,
    /// Tangential induction factor
    pub ap: Vec<f64>,
    /// Angle of attack
    pub alpha: Vec<f64>,
    pub cl: Vec<f64>,
    pub cd: Vec<f64>,
    /// Stall angle of attack of the local airfoil
    pub alpha_stall: Vec<f64>,
}

/// Black-box blade-element-momentum contract.
///
/// Implementations must be deterministic. The three input slices of
/// [`AeroOracle::evaluate`] are parallel: wind speed (m/s), rotor speed (rpm)
/// and pitch (deg). Scalar calls pass slices of length one.
pub trait AeroOracle: Send + Sync {
    /// Tip radius (m).
    fn rotor_radius(&self) -> f64;

    /// Air density (kg/m³).
    fn air_density(&self) -> f64;

    fn evaluate(
        &self,
        wind_speeds: &[f64],
        rotor_speeds_rpm: &[f64],
        pitches_deg: &[f64],
        coefficients: bool,
    ) -> AeroResult<Vec<AeroSample>>;

    /// Spanwise induction and airfoil state at one operating point.
    fn distributed_loads(
        &self,
        wind_speed: f64,
        rotor_speed_rpm: f64,
        pitch_deg: f64,
    ) -> AeroResult<SpanwiseLoads>;

    /// Single-point evaluation with coefficients.
    fn evaluate_point(
        &self,
        wind_speed: f64,
        rotor_speed_rpm: f64,
        pitch_deg: f64,
    ) -> AeroResult<AeroSample> {
        self.evaluate(&[wind_speed], &[rotor_speed_rpm], &[pitch_deg], true)?
            .into_iter()
            .next()
            .ok_or(AeroError::InvalidArg {
                what: "oracle returned no samples",
            })
    }

    /// Swept area π R² (m²).
    fn swept_area(&self) -> f64 {
        std::f64::consts::PI * self.rotor_radius().powi(2)
    }
}

/// Shared input validation for oracle implementations.
pub fn check_inputs(wind: &[f64], rpm: &[f64], pitch: &[f64]) -> AeroResult<()> {
    if wind.len() != rpm.len() {
        return Err(AeroError::LengthMismatch {
            what: "wind speed vs rotor speed",
            left: wind.len(),
            right: rpm.len(),
        });
    }
    if wind.len() != pitch.len() {
        return Err(AeroError::LengthMismatch {
            what: "wind speed vs pitch",
            left: wind.len(),
            right: pitch.len(),
        });
    }
    for ((&u, &w), &p) in wind.iter().zip(rpm).zip(pitch) {
        ensure_finite(u, "wind speed")?;
        ensure_finite(w, "rotor speed")?;
        ensure_finite(p, "pitch")?;
        if u < 0.0 {
            return Err(AeroError::NonPhysical {
                what: "negative wind speed",
            });
        }
        if w < 0.0 {
            return Err(AeroError::NonPhysical {
                what: "negative rotor speed",
            });
        }
    }
    Ok(())
}
