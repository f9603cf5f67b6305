//! Wind speed distributions and vertical shear.

use crate::error::{RotorError, RotorResult};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::gamma;

/// Mean-parameterized wind speed distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindDistribution {
    /// Weibull with shape `k`, scale chosen so the mean matches
    Weibull { mean: f64, k: f64 },
    Rayleigh { mean: f64 },
}

impl WindDistribution {
    pub fn validate(&self) -> RotorResult<()> {
        let ok = match *self {
            WindDistribution::Weibull { mean, k } => mean > 0.0 && k > 0.0,
            WindDistribution::Rayleigh { mean } => mean > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(RotorError::InvalidArg {
                what: "distribution parameters must be positive",
            })
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            WindDistribution::Weibull { mean, .. } | WindDistribution::Rayleigh { mean } => mean,
        }
    }

    /// Same distribution with a different mean.
    pub fn with_mean(self, mean: f64) -> Self {
        match self {
            WindDistribution::Weibull { k, .. } => WindDistribution::Weibull { mean, k },
            WindDistribution::Rayleigh { .. } => WindDistribution::Rayleigh { mean },
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        match *self {
            WindDistribution::Weibull { mean, k } => {
                let a = mean / gamma(1.0 + 1.0 / k);
                1.0 - (-(x / a).powf(k)).exp()
            }
            WindDistribution::Rayleigh { mean } => {
                1.0 - (-std::f64::consts::FRAC_PI_4 * (x / mean).powi(2)).exp()
            }
        }
    }

    pub fn cdf_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.cdf(x)).collect()
    }
}

/// Power-law shear profile `U(z) = U_ref (z / z_ref)^α`.
pub fn power_law_shear(u_ref: f64, z_ref: f64, z: f64, alpha: f64) -> RotorResult<f64> {
    if !(z_ref > 0.0 && z > 0.0) {
        return Err(RotorError::InvalidArg {
            what: "shear heights must be positive",
        });
    }
    Ok(u_ref * (z / z_ref).powf(alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weibull_shape_two_is_rayleigh() {
        let w = WindDistribution::Weibull { mean: 8.0, k: 2.0 };
        let r = WindDistribution::Rayleigh { mean: 8.0 };
        for x in [1.0, 5.0, 8.0, 12.0, 25.0] {
            assert!((w.cdf(x) - r.cdf(x)).abs() < 1e-12);
        }
    }

    #[test]
    fn cdf_limits() {
        let w = WindDistribution::Weibull { mean: 7.5, k: 2.3 };
        assert_eq!(w.cdf(0.0), 0.0);
        assert_eq!(w.cdf(-3.0), 0.0);
        assert!(w.cdf(60.0) > 0.999_999);
        let c = w.cdf_many(&[2.0, 4.0, 6.0]);
        assert!(c.windows(2).all(|p| p[1] > p[0]));
    }

    #[test]
    fn validation() {
        assert!(WindDistribution::Rayleigh { mean: 0.0 }.validate().is_err());
        assert!(WindDistribution::Weibull { mean: 6.0, k: -1.0 }.validate().is_err());
        assert!(WindDistribution::Weibull { mean: 6.0, k: 2.0 }.validate().is_ok());
    }

    #[test]
    fn shear_to_hub_height() {
        let u = power_law_shear(7.0, 50.0, 90.0, 0.2).unwrap();
        assert!((u - 7.0 * 1.8_f64.powf(0.2)).abs() < 1e-12);
        assert_eq!(power_law_shear(7.0, 90.0, 90.0, 0.14).unwrap(), 7.0);
        assert!(power_law_shear(7.0, 0.0, 90.0, 0.14).is_err());
    }
}
