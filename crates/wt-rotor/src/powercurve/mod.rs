//! Regulated power curve.
//!
//! The solve is a pipeline over a fixed wind-speed grid. Each stage takes the
//! curve produced by the previous one and returns a new curve together with
//! the region boundary it determined:
//!
//! 1. baseline: tip-speed-ratio tracking clipped to the rotor-speed limits
//! 2. Region 2 / 2.5: per-point pitch maximization below rated
//! 3. rated: exact rated wind speed and rotor speed
//! 4. Region 3: pitch regulation to hold rated power

mod evaluate;
mod stages;

use crate::drivetrain::DrivetrainModel;
use crate::error::{RotorError, RotorResult};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uom::si::angle::degree;
use uom::si::angular_velocity::revolution_per_minute;
use uom::si::power::watt;
use uom::si::velocity::meter_per_second;
use wt_aero::{AeroOracle, SpanwiseLoads};
use wt_core::interp::{Pchip, linspace};
use wt_core::units::{Angle, AngularVelocity, Force, Power, Torque, Velocity, deg, mps, newton_meters, newtons, rpm, rpm_to_rad_s, watts};

pub(crate) use evaluate::Evaluator;

/// Operating region of a grid point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Region2,
    Region25,
    Rated,
    Region3,
}

/// Control limits, fixed for one solve.
#[derive(Clone, Copy, Debug)]
pub struct ControlLimits {
    pub v_in: Velocity,
    pub v_out: Velocity,
    pub rated_power: Power,
    pub min_rotor_speed: AngularVelocity,
    pub max_rotor_speed: AngularVelocity,
    pub max_tip_speed: Velocity,
    /// Region 2 tip-speed ratio
    pub region2_tsr: f64,
    /// Region 2 pitch
    pub region2_pitch: Angle,
}

impl ControlLimits {
    /// Build from plain numbers: m/s, W, rpm, rpm, m/s, -, deg.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        v_in: f64,
        v_out: f64,
        rated_power: f64,
        min_rpm: f64,
        max_rpm: f64,
        max_tip_speed: f64,
        region2_tsr: f64,
        region2_pitch: f64,
    ) -> Self {
        Self {
            v_in: mps(v_in),
            v_out: mps(v_out),
            rated_power: watts(rated_power),
            min_rotor_speed: rpm(min_rpm),
            max_rotor_speed: rpm(max_rpm),
            max_tip_speed: mps(max_tip_speed),
            region2_tsr,
            region2_pitch: deg(region2_pitch),
        }
    }

    pub fn validate(&self) -> RotorResult<()> {
        let raw = self.raw();
        if !(raw.v_in > 0.0 && raw.v_out > raw.v_in) {
            return Err(RotorError::InvalidArg {
                what: "wind speed range must satisfy 0 < v_in < v_out",
            });
        }
        if !(raw.rated_power > 0.0) {
            return Err(RotorError::InvalidArg {
                what: "rated power must be positive",
            });
        }
        if !(raw.min_rpm >= 0.0 && raw.max_rpm > 0.0 && raw.min_rpm <= raw.max_rpm) {
            return Err(RotorError::InvalidArg {
                what: "rotor speed limits must satisfy 0 <= min <= max",
            });
        }
        if !(raw.max_tip_speed > 0.0) {
            return Err(RotorError::InvalidArg {
                what: "max tip speed must be positive",
            });
        }
        if !(raw.tsr > 0.0) {
            return Err(RotorError::InvalidArg {
                what: "region 2 tip-speed ratio must be positive",
            });
        }
        if !raw.pitch.is_finite() {
            return Err(RotorError::InvalidArg {
                what: "region 2 pitch must be finite",
            });
        }
        Ok(())
    }

    pub(crate) fn raw(&self) -> RawLimits {
        RawLimits {
            v_in: self.v_in.get::<meter_per_second>(),
            v_out: self.v_out.get::<meter_per_second>(),
            rated_power: self.rated_power.get::<watt>(),
            min_rpm: self.min_rotor_speed.get::<revolution_per_minute>(),
            max_rpm: self.max_rotor_speed.get::<revolution_per_minute>(),
            max_tip_speed: self.max_tip_speed.get::<meter_per_second>(),
            tsr: self.region2_tsr,
            pitch: self.region2_pitch.get::<degree>(),
        }
    }
}

/// Limits in solver units: m/s, W, rpm, deg.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RawLimits {
    pub v_in: f64,
    pub v_out: f64,
    pub rated_power: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
    pub max_tip_speed: f64,
    pub tsr: f64,
    pub pitch: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerCurveOptions {
    pub n_points: usize,
    pub n_spline: usize,
    /// Maximize power over pitch below rated
    pub regulate_region25: bool,
    /// Pitch to hold rated power above rated
    pub regulate_region3: bool,
}

impl Default for PowerCurveOptions {
    fn default() -> Self {
        Self {
            n_points: 20,
            n_spline: 200,
            regulate_region25: true,
            regulate_region3: true,
        }
    }
}

/// One solved grid point. Rotor speed in rpm, pitch in degrees, SI otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub wind_speed: f64,
    pub rotor_speed: f64,
    pub pitch: f64,
    pub aero_power: f64,
    pub electrical_power: f64,
    pub thrust: f64,
    pub torque: f64,
    pub root_moment: f64,
    /// Aerodynamic power coefficient
    pub cp: f64,
    /// Electrical power coefficient
    pub cp_elec: f64,
    pub ct: f64,
    pub cq: f64,
    pub cm: f64,
    pub region: Region,
}

/// Grid indices separating the regions: `0 <= i_2p5 <= i_rated < i_3 <= n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBoundaries {
    pub i_2p5: usize,
    pub i_rated: usize,
    pub i_3: usize,
    /// Whether rated power is reached inside the wind speed range
    pub region3: bool,
}

/// Conditions at the rated point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatedConditions {
    pub wind_speed: Velocity,
    pub rotor_speed: AngularVelocity,
    pub pitch: Angle,
    pub thrust: Force,
    pub torque: Torque,
}

impl RatedConditions {
    pub fn wind_speed_mps(&self) -> f64 {
        self.wind_speed.get::<meter_per_second>()
    }

    pub fn rotor_speed_rpm(&self) -> f64 {
        self.rotor_speed.get::<revolution_per_minute>()
    }

    pub fn pitch_deg(&self) -> f64 {
        self.pitch.get::<degree>()
    }

    pub fn thrust_n(&self) -> f64 {
        self.thrust.value
    }

    pub fn torque_nm(&self) -> f64 {
        self.torque.value
    }
}

/// Output of [`PowerCurveSolver::solve`].
#[derive(Clone, Debug)]
pub struct PowerCurve {
    pub points: Vec<OperatingPoint>,
    pub boundaries: RegionBoundaries,
    pub rated: RatedConditions,
    /// Wind speed at which the rotor-speed cap starts to bind, when inside the range
    pub v_region25: Option<f64>,
    pub v_spline: Vec<f64>,
    pub p_spline: Vec<f64>,
    /// Spanwise state at cut-in
    pub cutin_loads: SpanwiseLoads,
}

impl PowerCurve {
    pub fn wind_speeds(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.wind_speed).collect()
    }

    pub fn electrical_power(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.electrical_power).collect()
    }

    /// Stall constraint along the cut-in span, see [`crate::stall::no_stall_constraint`].
    pub fn cutin_stall_margin(&self, margin_deg: f64, min_s: f64) -> RotorResult<Vec<f64>> {
        let r = &self.cutin_loads.r;
        let (Some(&r0), Some(&r1)) = (r.first(), r.last()) else {
            return Ok(Vec::new());
        };
        let span = (r1 - r0).max(f64::EPSILON);
        let s: Vec<f64> = r.iter().map(|v| (v - r0) / span).collect();
        crate::stall::no_stall_constraint(
            &self.cutin_loads.alpha,
            &self.cutin_loads.alpha_stall,
            margin_deg,
            &s,
            min_s,
        )
    }
}

/// Regulated power-curve solver over an [`AeroOracle`].
pub struct PowerCurveSolver<'a, O: AeroOracle + ?Sized> {
    oracle: &'a O,
    drivetrain: &'a DrivetrainModel,
    limits: ControlLimits,
    options: PowerCurveOptions,
}

impl<'a, O: AeroOracle + ?Sized> PowerCurveSolver<'a, O> {
    pub fn new(
        oracle: &'a O,
        drivetrain: &'a DrivetrainModel,
        limits: ControlLimits,
        options: PowerCurveOptions,
    ) -> Self {
        Self {
            oracle,
            drivetrain,
            limits,
            options,
        }
    }

    pub fn solve(&self) -> RotorResult<PowerCurve> {
        self.limits.validate()?;
        if self.options.n_points < 2 {
            return Err(RotorError::InvalidArg {
                what: "power curve needs at least two grid points",
            });
        }
        if self.options.n_spline < 2 {
            return Err(RotorError::InvalidArg {
                what: "power curve spline needs at least two points",
            });
        }

        let raw = self.limits.raw();
        let radius = self.oracle.rotor_radius();
        let eval = Evaluator::new(self.oracle, self.drivetrain, raw.rated_power);

        let grid = stages::Grid::new(&raw, radius, self.options.n_points);
        if grid.omega_min > grid.omega_max {
            return Err(RotorError::InvalidArg {
                what: "minimum rotor speed exceeds the tip-speed limit",
            });
        }

        let curve = stages::baseline(&eval, &grid, &raw)?;
        let curve = if self.options.regulate_region25 {
            stages::region2(&eval, &grid, curve)?
        } else {
            curve
        };
        let curve = stages::rated(&eval, &grid, &raw, curve)?;
        let curve = stages::region3(&eval, &grid, &raw, self.options.regulate_region3, curve)?;

        let b = curve.boundaries;
        debug!(
            i_2p5 = b.i_2p5,
            i_rated = b.i_rated,
            i_3 = b.i_3,
            region3 = b.region3,
            "power curve regions"
        );

        let rated_pt = curve.points[b.i_rated];
        let rated = RatedConditions {
            wind_speed: mps(rated_pt.wind_speed),
            rotor_speed: rpm(rated_pt.rotor_speed),
            pitch: deg(rated_pt.pitch),
            thrust: newtons(rated_pt.thrust),
            torque: newton_meters(rated_pt.torque),
        };

        let (v_spline, p_spline) = spline(&curve.points, raw.v_in, raw.v_out, self.options.n_spline)?;

        let first = curve.points[0];
        let cutin_loads = self
            .oracle
            .distributed_loads(first.wind_speed, first.rotor_speed, first.pitch)?;

        Ok(PowerCurve {
            points: curve.points,
            boundaries: b,
            rated,
            v_region25: grid.v_region25,
            v_spline,
            p_spline,
            cutin_loads,
        })
    }
}

/// PCHIP fit of electrical power against wind speed, resampled on a uniform grid.
fn spline(
    points: &[OperatingPoint],
    v_in: f64,
    v_out: f64,
    n: usize,
) -> RotorResult<(Vec<f64>, Vec<f64>)> {
    // The rated point may coincide with a neighbour after the exact solve
    let mut xs = Vec::with_capacity(points.len());
    let mut ys = Vec::with_capacity(points.len());
    for p in points {
        if xs.last().is_none_or(|&last: &f64| p.wind_speed > last) {
            xs.push(p.wind_speed);
            ys.push(p.electrical_power);
        }
    }
    let v = linspace(v_in, v_out, n);
    if xs.len() < 2 {
        let level = ys.first().copied().unwrap_or(0.0);
        return Ok((v.clone(), vec![level; v.len()]));
    }
    let fit = Pchip::new(&xs, &ys)?;
    let p = fit.eval_many(&v);
    Ok((v, p))
}

/// Rotor speed (rad/s) that tracks `tsr` at wind speed `v`.
#[inline]
pub(crate) fn tsr_omega(v: f64, tsr: f64, radius: f64) -> f64 {
    v * tsr / radius
}

#[inline]
pub(crate) fn max_omega(raw: &RawLimits, radius: f64) -> f64 {
    (raw.max_tip_speed / radius).min(rpm_to_rad_s(raw.max_rpm))
}
