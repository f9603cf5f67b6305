//! Annual energy production.

use crate::distribution::WindDistribution;
use crate::error::{RotorError, RotorResult};
use crate::powercurve::PowerCurve;
use wt_core::interp::trapz;
use wt_core::units::{Energy, constants::HOURS_PER_YEAR, kwh};

/// `loss_factor · ∫ P dCDF · 8760 / 1000`, in kWh.
///
/// `power` (W) and `cdf` must be sampled at the same wind speeds.
pub fn aep(power: &[f64], cdf: &[f64], loss_factor: f64) -> RotorResult<f64> {
    if power.len() != cdf.len() {
        return Err(RotorError::Core(wt_core::WtError::LengthMismatch {
            what: "power curve vs cdf",
            left: power.len(),
            right: cdf.len(),
        }));
    }
    Ok(loss_factor * trapz(power, cdf)? * HOURS_PER_YEAR / 1.0e3)
}

/// Integrates a solved power curve against a wind distribution.
#[derive(Clone, Copy, Debug)]
pub struct AepIntegrator {
    pub distribution: WindDistribution,
    pub loss_factor: f64,
}

impl AepIntegrator {
    pub fn new(distribution: WindDistribution, loss_factor: f64) -> RotorResult<Self> {
        distribution.validate()?;
        if !(loss_factor >= 0.0) {
            return Err(RotorError::InvalidArg {
                what: "loss factor must be non-negative",
            });
        }
        Ok(Self {
            distribution,
            loss_factor,
        })
    }

    /// AEP from the spline of the curve.
    pub fn integrate(&self, curve: &PowerCurve) -> RotorResult<Energy> {
        let cdf = self.distribution.cdf_many(&curve.v_spline);
        Ok(kwh(aep(&curve.p_spline, &cdf, self.loss_factor)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn constant_power_over_full_cdf() {
        // 1 kW for the whole year
        let p = [1000.0, 1000.0, 1000.0];
        let cdf = [0.0, 0.5, 1.0];
        assert!((aep(&p, &cdf, 1.0).unwrap() - 8760.0).abs() < 1e-9);
        assert!((aep(&p, &cdf, 0.95).unwrap() - 8322.0).abs() < 1e-9);
    }

    #[test]
    fn shape_mismatch_is_error() {
        assert!(aep(&[1.0, 2.0], &[0.0], 1.0).is_err());
        assert!(AepIntegrator::new(WindDistribution::Rayleigh { mean: 7.0 }, -0.1).is_err());
    }

    proptest! {
        #[test]
        fn monotone_in_loss_factor(a in 0.0f64..1.0, d in 0.001f64..0.5) {
            let p: Vec<f64> = (0..10).map(|i| 1.0e5 * i as f64).collect();
            let cdf: Vec<f64> = (0..10).map(|i| i as f64 / 9.0).collect();
            prop_assert!(aep(&p, &cdf, a + d).unwrap() > aep(&p, &cdf, a).unwrap());
        }

        #[test]
        fn invariant_to_pair_order(rot in 0usize..12) {
            let v: Vec<f64> = (0..12).map(|i| 3.0 + 2.0 * i as f64).collect();
            let p: Vec<f64> = v.iter().map(|x| 1.0e3 * x.powi(3)).collect();
            let dist = WindDistribution::Weibull { mean: 9.0, k: 2.1 };
            let cdf = dist.cdf_many(&v);
            let expected = aep(&p, &cdf, 1.0).unwrap();

            // Scramble the (v, P, CDF) triples, then sort them back by wind speed
            let mut pairs: Vec<(f64, f64, f64)> =
                v.iter().zip(&p).zip(&cdf).map(|((a, b), c)| (*a, *b, *c)).collect();
            pairs.rotate_left(rot);
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            let ps: Vec<f64> = pairs.iter().map(|t| t.1).collect();
            let cs: Vec<f64> = pairs.iter().map(|t| t.2).collect();
            prop_assert!((aep(&ps, &cs, 1.0).unwrap() - expected).abs() < 1e-9 * expected);
        }
    }
}
