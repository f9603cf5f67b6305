//! Oracle plus drivetrain evaluation of grid points.

use super::{OperatingPoint, Region};
use crate::drivetrain::DrivetrainModel;
use crate::error::{RotorError, RotorResult};
use wt_aero::{AeroCoefficients, AeroOracle};

pub(crate) struct Evaluator<'a, O: AeroOracle + ?Sized> {
    oracle: &'a O,
    drivetrain: &'a DrivetrainModel,
    rated_power: f64,
}

impl<'a, O: AeroOracle + ?Sized> Evaluator<'a, O> {
    pub fn new(oracle: &'a O, drivetrain: &'a DrivetrainModel, rated_power: f64) -> Self {
        Self {
            oracle,
            drivetrain,
            rated_power,
        }
    }

    pub fn rated_power(&self) -> f64 {
        self.rated_power
    }

    /// Power available in the wind, `0.5 ρ A v³`.
    pub fn wind_power(&self, v: f64) -> f64 {
        0.5 * self.oracle.air_density() * self.oracle.swept_area() * v.powi(3)
    }

    /// Full evaluation of parallel `(v, rpm, pitch)` arrays.
    pub fn points(&self, v: &[f64], rpm: &[f64], pitch: &[f64]) -> RotorResult<Vec<OperatingPoint>> {
        let samples = self.oracle.evaluate(v, rpm, pitch, true)?;
        if samples.len() != v.len() {
            return Err(RotorError::Core(wt_core::WtError::LengthMismatch {
                what: "oracle samples",
                left: samples.len(),
                right: v.len(),
            }));
        }

        Ok(samples
            .iter()
            .zip(v)
            .zip(rpm)
            .zip(pitch)
            .map(|(((s, &v), &w), &p)| {
                let c = s.coefficients.unwrap_or_default();
                let (p_elec, _) = self
                    .drivetrain
                    .efficiency(s.loads.power, self.rated_power, w);
                self.assemble(v, w, p, s.loads, c, p_elec)
            })
            .collect())
    }

    pub fn point(&self, v: f64, rpm: f64, pitch: f64) -> RotorResult<OperatingPoint> {
        let mut pts = self.points(&[v], &[rpm], &[pitch])?;
        pts.pop().ok_or(RotorError::InvalidArg {
            what: "oracle returned no samples",
        })
    }

    /// Aerodynamic power only.
    pub fn aero(&self, v: f64, rpm: f64, pitch: f64) -> RotorResult<f64> {
        let s = self.oracle.evaluate(&[v], &[rpm], &[pitch], false)?;
        s.first().map(|s| s.loads.power).ok_or(RotorError::InvalidArg {
            what: "oracle returned no samples",
        })
    }

    /// Electrical power only; the objective of the rated searches.
    pub fn electrical(&self, v: f64, rpm: f64, pitch: f64) -> RotorResult<f64> {
        let aero = self.aero(v, rpm, pitch)?;
        Ok(self.drivetrain.efficiency(aero, self.rated_power, rpm).0)
    }

    /// Electrical power coefficient.
    pub fn cp_elec(&self, v: f64, p_elec: f64) -> f64 {
        let avail = self.wind_power(v);
        if avail > 0.0 { p_elec / avail } else { 0.0 }
    }

    fn assemble(
        &self,
        v: f64,
        rpm: f64,
        pitch: f64,
        loads: wt_aero::AeroLoads,
        c: AeroCoefficients,
        p_elec: f64,
    ) -> OperatingPoint {
        OperatingPoint {
            wind_speed: v,
            rotor_speed: rpm,
            pitch,
            aero_power: loads.power,
            electrical_power: p_elec,
            thrust: loads.thrust,
            torque: loads.torque,
            root_moment: loads.moment,
            cp: c.cp,
            cp_elec: self.cp_elec(v, p_elec),
            ct: c.ct,
            cq: c.cq,
            cm: c.cm,
            region: Region::Region2,
        }
    }
}
