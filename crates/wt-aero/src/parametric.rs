//! Closed-form rotor model.
//!
//! ## Model
//!
//! The power coefficient is a smooth surface over tip-speed ratio λ and
//! pitch β (deg):
//!
//! ```text
//! Cp(λ, β) = cp_max · exp(-((λ - λ*)/s_λ)²) · exp(-((β - κ(λ - λ*))/s_β)²)
//! ```
//!
//! so that the best pitch is zero at the design tip-speed ratio λ* and moves
//! by κ degrees per unit of λ away from it. Thrust follows from the ideal
//! actuator disc: the axial induction `a ≤ 1/3` solving `Cp = 4a(1-a)²` gives
//! `Ct = 4a(1-a)`. Torque is `P/Ω` and the root moment places the thrust of
//! one blade at two thirds of the span.

use crate::error::{AeroError, AeroResult};
use crate::oracle::{AeroCoefficients, AeroLoads, AeroOracle, AeroSample, SpanwiseLoads, check_inputs};
use uom::si::length::meter;
use uom::si::mass_density::kilogram_per_cubic_meter;
use wt_core::units::{Density, Length, m, rpm_to_rad_s};

/// Parameters of the Cp(λ, β) surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CpSurface {
    /// Peak power coefficient (must stay below the Betz limit)
    pub cp_max: f64,
    /// Tip-speed ratio at the peak
    pub tsr_opt: f64,
    pub tsr_width: f64,
    /// Shift of the optimal pitch per unit tip-speed ratio (deg)
    pub pitch_per_tsr: f64,
    /// Pitch width (deg)
    pub pitch_width: f64,
}

impl Default for CpSurface {
    fn default() -> Self {
        Self {
            cp_max: 0.482,
            tsr_opt: 7.55,
            tsr_width: 4.0,
            pitch_per_tsr: 0.8,
            pitch_width: 12.0,
        }
    }
}

impl CpSurface {
    pub fn cp(&self, tsr: f64, pitch_deg: f64) -> f64 {
        let dl = tsr - self.tsr_opt;
        let dp = pitch_deg - self.pitch_per_tsr * dl;
        self.cp_max * (-(dl / self.tsr_width).powi(2)).exp() * (-(dp / self.pitch_width).powi(2)).exp()
    }

    /// Pitch that maximizes Cp at `tsr`.
    pub fn best_pitch(&self, tsr: f64) -> f64 {
        self.pitch_per_tsr * (tsr - self.tsr_opt)
    }
}

/// Parametric rotor implementing [`AeroOracle`].
#[derive(Clone, Debug)]
pub struct ParametricRotor {
    pub tip_radius: Length,
    pub hub_radius: Length,
    pub n_blades: usize,
    pub air_density: Density,
    pub surface: CpSurface,
    /// Number of spanwise stations for distributed loads
    pub n_stations: usize,
    /// Design angle of attack (deg)
    pub alpha_design: f64,
    /// Stall angle of attack (deg)
    pub alpha_stall: f64,
}

impl ParametricRotor {
    pub fn new(
        tip_radius: Length,
        hub_radius: Length,
        n_blades: usize,
        air_density: Density,
        surface: CpSurface,
    ) -> AeroResult<Self> {
        if !(tip_radius.value > 0.0) {
            return Err(AeroError::InvalidArg {
                what: "tip radius must be positive",
            });
        }
        if hub_radius.value < 0.0 || hub_radius.value >= tip_radius.value {
            return Err(AeroError::InvalidArg {
                what: "hub radius must lie in [0, tip radius)",
            });
        }
        if n_blades == 0 {
            return Err(AeroError::InvalidArg {
                what: "blade count must be positive",
            });
        }
        if !(air_density.value > 0.0) {
            return Err(AeroError::InvalidArg {
                what: "air density must be positive",
            });
        }
        if !(surface.cp_max > 0.0 && surface.cp_max < 16.0 / 27.0) {
            return Err(AeroError::NonPhysical {
                what: "cp_max must lie in (0, 16/27)",
            });
        }
        if !(surface.tsr_width > 0.0 && surface.pitch_width > 0.0) {
            return Err(AeroError::InvalidArg {
                what: "surface widths must be positive",
            });
        }

        Ok(Self {
            tip_radius,
            hub_radius,
            n_blades,
            air_density,
            surface,
            n_stations: 17,
            alpha_design: 6.0,
            alpha_stall: 15.0,
        })
    }

    /// A 126 m, three-bladed rotor in the 5 MW class.
    pub fn reference_5mw() -> Self {
        Self {
            tip_radius: m(63.0),
            hub_radius: m(1.5),
            n_blades: 3,
            air_density: Density::new::<kilogram_per_cubic_meter>(1.225),
            surface: CpSurface::default(),
            n_stations: 17,
            alpha_design: 6.0,
            alpha_stall: 15.0,
        }
    }

    fn radius(&self) -> f64 {
        self.tip_radius.get::<meter>()
    }

    fn sample(&self, u: f64, rpm: f64, pitch: f64, coefficients: bool) -> AeroSample {
        if u <= 0.0 {
            return AeroSample {
                loads: AeroLoads::default(),
                coefficients: coefficients.then(AeroCoefficients::default),
            };
        }

        let r = self.radius();
        let omega = rpm_to_rad_s(rpm);
        let tsr = omega * r / u;
        let qa = 0.5 * self.air_density() * self.swept_area() * u * u;

        let cp = self.surface.cp(tsr, pitch);
        let a = axial_induction(cp);
        let ct = 4.0 * a * (1.0 - a);

        let power = qa * u * cp;
        let thrust = qa * ct;
        let torque = if omega > 0.0 { power / omega } else { 0.0 };
        let moment = thrust * (2.0 * r / 3.0) / self.n_blades as f64;

        AeroSample {
            loads: AeroLoads {
                power,
                thrust,
                torque,
                moment,
            },
            coefficients: coefficients.then(|| AeroCoefficients {
                cp,
                ct,
                cq: if tsr > 0.0 { cp / tsr } else { 0.0 },
                cm: moment / (qa * r),
            }),
        }
    }
}

/// Root of `4a(1-a)² = cp` on `[0, 1/3]` by bisection.
fn axial_induction(cp: f64) -> f64 {
    let target = cp.clamp(0.0, 16.0 / 27.0);
    let (mut lo, mut hi) = (0.0_f64, 1.0 / 3.0);
    for _ in 0..60 {
        let mid = 0.5 * (lo + hi);
        if 4.0 * mid * (1.0 - mid).powi(2) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

impl AeroOracle for ParametricRotor {
    fn rotor_radius(&self) -> f64 {
        self.radius()
    }

    fn air_density(&self) -> f64 {
        self.air_density.get::<kilogram_per_cubic_meter>()
    }

    fn evaluate(
        &self,
        wind_speeds: &[f64],
        rotor_speeds_rpm: &[f64],
        pitches_deg: &[f64],
        coefficients: bool,
    ) -> AeroResult<Vec<AeroSample>> {
        check_inputs(wind_speeds, rotor_speeds_rpm, pitches_deg)?;
        Ok(wind_speeds
            .iter()
            .zip(rotor_speeds_rpm)
            .zip(pitches_deg)
            .map(|((&u, &w), &p)| self.sample(u, w, p, coefficients))
            .collect())
    }

    fn distributed_loads(
        &self,
        wind_speed: f64,
        rotor_speed_rpm: f64,
        pitch_deg: f64,
    ) -> AeroResult<SpanwiseLoads> {
        check_inputs(&[wind_speed], &[rotor_speed_rpm], &[pitch_deg])?;
        if wind_speed <= 0.0 {
            return Err(AeroError::NonPhysical {
                what: "distributed loads need a positive wind speed",
            });
        }

        let r_tip = self.radius();
        let r_hub = self.hub_radius.get::<meter>();
        let n = self.n_stations.max(2);
        let tsr = rpm_to_rad_s(rotor_speed_rpm) * r_tip / wind_speed;
        let a = axial_induction(self.surface.cp(tsr, pitch_deg));

        let mut out = SpanwiseLoads::default();
        for k in 0..n {
            // Station midpoints between hub and tip
            let r = r_hub + (k as f64 + 0.5) / n as f64 * (r_tip - r_hub);
            let tsr_r = tsr * r / r_tip;
            let ap = if tsr_r > 0.0 {
                a * (1.0 - a) / (tsr_r * tsr_r)
            } else {
                0.0
            };
            let phi = (1.0 - a).atan2((1.0 + ap) * tsr_r).to_degrees();
            let twist = (2.0 / 3.0_f64).atan2(self.surface.tsr_opt * r / r_tip).to_degrees()
                - self.alpha_design;
            let alpha = phi - twist - pitch_deg;
            let (cl, cd) = self.polar(alpha);

            out.r.push(r);
            out.a.push(a);
            out.ap.push(ap);
            out.alpha.push(alpha);
            out.cl.push(cl);
            out.cd.push(cd);
            out.alpha_stall.push(self.alpha_stall);
        }
        Ok(out)
    }
}

impl ParametricRotor {
    /// Thin-airfoil lift up to stall, flat-plate behaviour beyond it.
    fn polar(&self, alpha_deg: f64) -> (f64, f64) {
        let alpha = alpha_deg.to_radians();
        if alpha_deg.abs() <= self.alpha_stall {
            let ratio = alpha_deg / self.alpha_stall;
            (2.0 * std::f64::consts::PI * alpha.sin(), 0.008 + 0.02 * ratio * ratio)
        } else {
            (2.0 * alpha.sin() * alpha.cos(), 2.0 * alpha.sin().powi(2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::units::rad_s_to_rpm;

    #[test]
    fn peak_at_design_point() {
        let s = CpSurface::default();
        let peak = s.cp(s.tsr_opt, 0.0);
        assert!((peak - s.cp_max).abs() < 1e-12);
        assert!(s.cp(s.tsr_opt + 1.0, 0.0) < peak);
        assert!(s.cp(s.tsr_opt, 2.0) < peak);
        assert!((s.best_pitch(s.tsr_opt + 2.0) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn induction_inverts_cp() {
        for cp in [0.0, 0.1, 0.3, 0.45, 16.0 / 27.0] {
            let a = axial_induction(cp);
            assert!((4.0 * a * (1.0 - a).powi(2) - cp).abs() < 1e-9);
            assert!((0.0..=1.0 / 3.0 + 1e-12).contains(&a));
        }
    }

    #[test]
    fn power_balance() {
        let rotor = ParametricRotor::reference_5mw();
        let u = 9.0;
        let rpm = rad_s_to_rpm(7.55 * u / 63.0);
        let s = rotor.evaluate_point(u, rpm, 0.0).unwrap();
        let c = s.coefficients.unwrap();
        let avail = 0.5 * 1.225 * rotor.swept_area() * u.powi(3);
        assert!((s.loads.power / avail - c.cp).abs() < 1e-12);
        assert!((c.cp - 0.482).abs() < 1e-9);
        assert!((s.loads.torque * rpm_to_rad_s(rpm) - s.loads.power).abs() < 1e-6);
        assert!((c.cq - c.cp / 7.55).abs() < 1e-9);
    }

    #[test]
    fn zero_wind_is_zero_load() {
        let rotor = ParametricRotor::reference_5mw();
        let s = rotor.evaluate(&[0.0], &[10.0], &[0.0], false).unwrap();
        assert_eq!(s[0].loads, AeroLoads::default());
        assert!(s[0].coefficients.is_none());
    }

    #[test]
    fn constructor_validates() {
        let rho = Density::new::<kilogram_per_cubic_meter>(1.225);
        assert!(ParametricRotor::new(m(0.0), m(0.0), 3, rho, CpSurface::default()).is_err());
        assert!(ParametricRotor::new(m(63.0), m(70.0), 3, rho, CpSurface::default()).is_err());
        assert!(ParametricRotor::new(m(63.0), m(1.5), 0, rho, CpSurface::default()).is_err());
        let betz = CpSurface {
            cp_max: 0.7,
            ..CpSurface::default()
        };
        assert!(ParametricRotor::new(m(63.0), m(1.5), 3, rho, betz).is_err());
        assert!(ParametricRotor::new(m(63.0), m(1.5), 3, rho, CpSurface::default()).is_ok());
    }

    #[test]
    fn spanwise_stations_between_hub_and_tip() {
        let rotor = ParametricRotor::reference_5mw();
        let d = rotor.distributed_loads(3.0, 6.9, 0.0).unwrap();
        assert_eq!(d.r.len(), rotor.n_stations);
        assert!(d.r.iter().all(|&r| r > 1.5 && r < 63.0));
        assert!(d.r.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(d.alpha.len(), d.cl.len());
        assert!(rotor.distributed_loads(0.0, 6.9, 0.0).is_err());
    }

    proptest::proptest! {
        #[test]
        fn coefficients_stay_physical(u in 1.0f64..30.0, rpm in 0.5f64..20.0, pitch in -10.0f64..40.0) {
            let rotor = ParametricRotor::reference_5mw();
            let s = rotor.evaluate_point(u, rpm, pitch).unwrap();
            let c = s.coefficients.unwrap();
            proptest::prop_assert!(c.cp >= 0.0 && c.cp <= rotor.surface.cp_max + 1e-12);
            proptest::prop_assert!(c.ct >= 0.0 && c.ct <= 8.0 / 9.0 + 1e-9);
            proptest::prop_assert!(s.loads.thrust >= 0.0);
        }
    }
}
