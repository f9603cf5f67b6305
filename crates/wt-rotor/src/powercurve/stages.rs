//! Region stages of the power-curve pipeline.

use super::{Evaluator, OperatingPoint, RawLimits, Region, RegionBoundaries, max_omega, tsr_omega};
use crate::error::RotorResult;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};
use wt_aero::AeroOracle;
use wt_core::interp::linspace;
use wt_core::units::{rad_s_to_rpm, rpm_to_rad_s};
use wt_solver::{
    BoxBounds, BracketConfig, NewtonConfig, SolverError, SolverResult, brentq,
    finite_difference_jacobian, maximize_bounded, minimize_bounded, newton_solve_bounded,
};

/// Half-width of the Region 2 pitch search around the previous solution (deg).
const PITCH_SEARCH: f64 = 10.0;
const MAX_ITER: usize = 40;
/// Pitch step for the ∂P/∂pitch estimate (deg).
const PITCH_STEP: f64 = 1e-3;

/// Wind-speed grid with the tip-speed-ratio and clipped rotor speeds (rad/s).
pub(crate) struct Grid {
    pub u: Vec<f64>,
    pub omega_tsr: Vec<f64>,
    pub omega: Vec<f64>,
    pub omega_min: f64,
    pub omega_max: f64,
    pub tsr: f64,
    pub radius: f64,
    pub v_region25: Option<f64>,
}

impl Grid {
    pub fn new(raw: &RawLimits, radius: f64, n: usize) -> Self {
        let u = linspace(raw.v_in, raw.v_out, n);
        let omega_max = max_omega(raw, radius);
        let omega_min = rpm_to_rad_s(raw.min_rpm);
        let omega_tsr: Vec<f64> = u.iter().map(|&v| tsr_omega(v, raw.tsr, radius)).collect();
        let omega: Vec<f64> = omega_tsr
            .iter()
            .map(|&w| w.min(omega_max).max(omega_min))
            .collect();

        // Wind speed where tip-speed-ratio tracking meets the speed cap
        let v_region25 = match omega_tsr.last() {
            Some(&last) if omega_max < last => Some(omega_max * radius / raw.tsr),
            _ => None,
        };

        Self {
            u,
            omega_tsr,
            omega,
            omega_min,
            omega_max,
            tsr: raw.tsr,
            radius,
            v_region25,
        }
    }

    pub fn len(&self) -> usize {
        self.u.len()
    }

    fn speed_capped(&self, omega: f64) -> bool {
        omega >= self.omega_max && self.omega_max < f64::INFINITY
    }

    /// Rotor speed (rpm) used by the rated residual at wind speed `v`.
    fn rated_rpm(&self, v: f64) -> f64 {
        rad_s_to_rpm(tsr_omega(v, self.tsr, self.radius).min(self.omega_max))
    }
}

/// Curve state handed from one stage to the next.
pub(crate) struct Curve {
    pub points: Vec<OperatingPoint>,
    pub boundaries: RegionBoundaries,
    /// Coarse rated wind speed estimate
    v_rated_guess: f64,
    /// Region 2.5 encountered by the pitch sweep
    region25: bool,
}

/// Stage 1: tip-speed-ratio tracking at the Region 2 pitch.
pub(crate) fn baseline<O: AeroOracle + ?Sized>(
    eval: &Evaluator<'_, O>,
    grid: &Grid,
    raw: &RawLimits,
) -> RotorResult<Curve> {
    let n = grid.len();
    let rpm: Vec<f64> = grid.omega.iter().map(|&w| rad_s_to_rpm(w)).collect();
    let pitch = vec![raw.pitch; n];
    let mut points = eval.points(&grid.u, &rpm, &pitch)?;

    let rated = eval.rated_power();
    let crossing = points.iter().position(|p| p.electrical_power >= rated);
    let (i_3, region3) = match crossing {
        Some(k) => (k + 1, true),
        None => (n, false),
    };

    // Rated guess from the electrical curve inside the crossing cell
    let (i_rated, v_rated_guess) = match crossing {
        Some(0) => (0, grid.u[0]),
        Some(k) => {
            let (p0, p1) = (points[k - 1].electrical_power, points[k].electrical_power);
            let (u0, u1) = (grid.u[k - 1], grid.u[k]);
            let frac = if p1 > p0 { (rated - p0) / (p1 - p0) } else { 1.0 };
            (k, u0 + frac.clamp(0.0, 1.0) * (u1 - u0))
        }
        None => (n - 1, grid.u[n - 1]),
    };

    let i_2p5 = match grid.v_region25 {
        Some(v) => grid.u.iter().position(|&u| u >= v).unwrap_or(n - 1),
        None => n - 1,
    }
    .min(i_rated);

    for (p, &w) in points.iter_mut().zip(&grid.omega) {
        p.region = if grid.speed_capped(w) {
            Region::Region25
        } else {
            Region::Region2
        };
    }

    debug!(i_3, i_rated, i_2p5, v_rated_guess, "baseline curve");
    Ok(Curve {
        points,
        boundaries: RegionBoundaries {
            i_2p5,
            i_rated,
            i_3,
            region3,
        },
        v_rated_guess,
        region25: false,
    })
}

/// Stage 2: maximize power over pitch below rated.
///
/// The objective is shaft power. Near idling the loss polynomial makes
/// electrical power fall as shaft power rises. Points already
/// tracking the Region 2 tip-speed ratio are optimal and kept.
/// The sweep stops at the first point above rated, which becomes the rated
/// index.
pub(crate) fn region2<O: AeroOracle + ?Sized>(
    eval: &Evaluator<'_, O>,
    grid: &Grid,
    mut curve: Curve,
) -> RotorResult<Curve> {
    let rated = eval.rated_power();
    let mut b = curve.boundaries;

    for i in 0..b.i_3 {
        if grid.omega[i] == grid.omega_tsr[i] {
            continue;
        }

        let pitch0 = if i == 0 {
            curve.points[0].pitch
        } else {
            curve.points[i - 1].pitch
        };
        let v = grid.u[i];
        let rpm = curve.points[i].rotor_speed;

        let best = maximize_bounded(
            |p| Ok(eval.aero(v, rpm, p)?),
            pitch0 - PITCH_SEARCH,
            pitch0 + PITCH_SEARCH,
            1e-2,
            MAX_ITER,
        )?;
        if !best.converged {
            debug!(i, v, pitch = best.x, "pitch maximization hit iteration cap");
        }

        let mut pt = eval.point(v, rpm, best.x)?;
        pt.region = curve.points[i].region;
        curve.points[i] = pt;

        if !curve.region25 && grid.speed_capped(grid.omega[i]) && pt.electrical_power < rated {
            curve.region25 = true;
            b.i_2p5 = i;
            debug!(i, v, "region 2.5 starts");
        }

        if pt.electrical_power > rated {
            b.i_3 = i + 1;
            b.i_rated = i;
            b.region3 = true;
            debug!(i, v, "rated power reached during pitch sweep");
            break;
        }
    }

    b.i_2p5 = b.i_2p5.min(b.i_rated);
    curve.boundaries = b;
    Ok(curve)
}

/// Stage 3: exact rated wind speed, then cap the rotor speed from there on.
pub(crate) fn rated<O: AeroOracle + ?Sized>(
    eval: &Evaluator<'_, O>,
    grid: &Grid,
    raw: &RawLimits,
    mut curve: Curve,
) -> RotorResult<Curve> {
    let n = grid.len();
    let i = curve.boundaries.i_rated;
    if !curve.boundaries.region3 || n < 2 {
        // Rated conditions reported at the last grid point
        return Ok(curve);
    }
    // Crossing on the last cell brackets against the final point itself
    let next = (i + 1).min(n - 1);

    let rated = eval.rated_power();
    let lo = grid.u[i.saturating_sub(1)];
    let hi = grid.u[next];
    let residual = |pitch: f64, v: f64| -> SolverResult<f64> {
        Ok(eval.electrical(v, grid.rated_rpm(v), pitch)? - rated)
    };

    let (v_rated, pitch_rated) = if curve.region25 {
        let p_prev = curve.points[i.saturating_sub(1)].pitch;
        let p_next = curve.points[next].pitch;
        let bounds = BoxBounds::new(
            vec![p_prev.min(p_next), lo],
            vec![p_prev.max(p_next), hi],
        )?;
        match solve_rated_region25(&residual, &bounds, grid.u[i], rated)? {
            Some(sol) => sol,
            None => {
                warn!(i, "rated solve in region 2.5 failed, keeping coarse estimate");
                (curve.v_rated_guess.clamp(lo, hi), 0.0)
            }
        }
    } else {
        let v = root_or_min_abs(|v| residual(0.0, v), lo, hi, 1e-3)?;
        (v, 0.0)
    };

    let omega_rated = tsr_omega(v_rated, grid.tsr, grid.radius).min(grid.omega_max);
    for (k, p) in curve.points.iter_mut().enumerate().skip(i) {
        let w = rpm_to_rad_s(p.rotor_speed)
            .min(omega_rated)
            .max(grid.omega_min);
        p.rotor_speed = rad_s_to_rpm(w);
        if k > i {
            p.region = Region::Region3;
        }
    }

    let mut pt = eval.point(v_rated, curve.points[i].rotor_speed, pitch_rated)?;
    pt.electrical_power = raw.rated_power;
    pt.cp_elec = eval.cp_elec(v_rated, raw.rated_power);
    pt.region = Region::Rated;
    curve.points[i] = pt;

    debug!(v_rated, pitch_rated, rpm = pt.rotor_speed, "rated point");
    Ok(curve)
}

/// Joint (pitch, V) rated solve: stationarity of P in pitch and P = rated.
///
/// When the pitch optimum lies outside the box the pitch stays on the bound
/// and V alone is solved from P = rated.
fn solve_rated_region25<F>(
    residual: &F,
    bounds: &BoxBounds,
    v0: f64,
    rated: f64,
) -> RotorResult<Option<(f64, f64)>>
where
    F: Fn(f64, f64) -> SolverResult<f64>,
{
    let system = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
        let (pitch, v) = (x[0], x[1]);
        let dp = (residual(pitch + PITCH_STEP, v)? - residual(pitch - PITCH_STEP, v)?)
            / (2.0 * PITCH_STEP);
        Ok(DVector::from_vec(vec![dp / rated, residual(pitch, v)? / rated]))
    };
    let jacobian = |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
        finite_difference_jacobian(x, system, 1e-6)
    };

    let x0 = DVector::from_vec(vec![0.0, v0]);
    let out = newton_solve_bounded(x0, system, jacobian, bounds, &NewtonConfig::default())?;
    let (pitch, v) = (out.x[0], out.x[1]);
    if out.converged && v.is_finite() {
        return Ok(Some((v, pitch)));
    }

    let on_bound = (pitch - bounds.lower[0]).abs() < 1e-9 || (pitch - bounds.upper[0]).abs() < 1e-9;
    if !on_bound {
        return Ok(None);
    }
    let cfg = BracketConfig::default();
    match brentq(|v| residual(pitch, v), bounds.lower[1], bounds.upper[1], &cfg) {
        Ok(root) if root.converged => Ok(Some((root.x, pitch))),
        Ok(_) | Err(SolverError::NoSignChange { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Bracketed root of `f`; without a sign change, the minimizer of `|f|`.
fn root_or_min_abs<F>(f: F, lo: f64, hi: f64, xatol: f64) -> RotorResult<f64>
where
    F: Fn(f64) -> SolverResult<f64>,
{
    let cfg = BracketConfig::default();
    match brentq(&f, lo, hi, &cfg) {
        Ok(root) => Ok(root.x),
        Err(SolverError::NoSignChange { .. }) => {
            debug!(lo, hi, "no sign change, minimizing |residual|");
            let m = minimize_bounded(|x| f(x).map(f64::abs), lo, hi, xatol, MAX_ITER)?;
            Ok(m.x)
        }
        Err(e) => Err(e.into()),
    }
}

/// Stage 4: hold rated power above rated.
pub(crate) fn region3<O: AeroOracle + ?Sized>(
    eval: &Evaluator<'_, O>,
    grid: &Grid,
    raw: &RawLimits,
    regulate: bool,
    mut curve: Curve,
) -> RotorResult<Curve> {
    let b = curve.boundaries;
    if !b.region3 {
        return Ok(curve);
    }
    let rated = raw.rated_power;

    for i in b.i_3..grid.len() {
        let v = grid.u[i];
        let rpm = curve.points[i].rotor_speed;

        let pt = if regulate {
            let p0 = curve.points[i - 1].pitch;
            let res = |p: f64| -> SolverResult<f64> { Ok(eval.electrical(v, rpm, p)? - rated) };
            let pitch = match brentq(&res, p0, p0 + PITCH_SEARCH, &BracketConfig::default()) {
                Ok(root) => root.x,
                Err(SolverError::NoSignChange { .. }) => {
                    debug!(i, v, "region 3 pitch not bracketed, minimizing |residual|");
                    minimize_bounded(|p| res(p).map(f64::abs), p0 - 5.0, p0 + 15.0, 1e-3, MAX_ITER)?.x
                }
                Err(e) => return Err(e.into()),
            };
            let mut pt = eval.point(v, rpm, pitch)?;
            pt.electrical_power = rated;
            pt.cp_elec = eval.cp_elec(v, rated);
            pt
        } else {
            let omega = rpm_to_rad_s(rpm);
            let cp = eval.cp_elec(v, rated);
            OperatingPoint {
                wind_speed: v,
                rotor_speed: rpm,
                pitch: 0.0,
                aero_power: curve.points[i].aero_power,
                electrical_power: rated,
                thrust: 0.0,
                torque: if omega > 0.0 { rated / omega } else { 0.0 },
                root_moment: 0.0,
                cp: curve.points[i].cp,
                cp_elec: cp,
                ct: 0.0,
                cq: 0.0,
                cm: 0.0,
                region: Region::Region3,
            }
        };
        curve.points[i] = OperatingPoint {
            region: Region::Region3,
            ..pt
        };
    }

    Ok(curve)
}
