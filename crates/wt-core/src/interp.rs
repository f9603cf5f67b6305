//! Grids, interpolation and quadrature on sampled curves.

use crate::{Real, WtError, WtResult};

/// `n` evenly spaced points from `start` to `end`, both included.
pub fn linspace(start: Real, end: Real, n: usize) -> Vec<Real> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let delta = (end - start) / (n - 1) as Real;
            let mut points: Vec<Real> = (0..n).map(|i| start + i as Real * delta).collect();
            // Ensure exact endpoint
            points[n - 1] = end;
            points
        }
    }
}

/// Piecewise-linear interpolation with the ends held constant.
///
/// `xp` must be increasing. Outside `[xp[0], xp[n-1]]` the end values of `fp`
/// are returned.
pub fn interp_linear(x: Real, xp: &[Real], fp: &[Real]) -> Real {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return Real::NAN;
    }
    if n == 1 || x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    let k = xp[..n].partition_point(|&v| v <= x);
    let (x0, x1) = (xp[k - 1], xp[k]);
    let (f0, f1) = (fp[k - 1], fp[k]);
    if x1 == x0 {
        return f1;
    }
    f0 + (f1 - f0) * (x - x0) / (x1 - x0)
}

/// Trapezoid-rule integral of `y` over the sample points `x`.
pub fn trapz(y: &[Real], x: &[Real]) -> WtResult<Real> {
    if y.len() != x.len() {
        return Err(WtError::LengthMismatch {
            what: "trapz samples",
            left: y.len(),
            right: x.len(),
        });
    }
    Ok(x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum())
}

/// Bin index of `x` for increasing `bins`: `i` such that
/// `bins[i-1] <= x < bins[i]`, `0` below the first edge and `bins.len()` at
/// or above the last.
pub fn digitize(x: Real, bins: &[Real]) -> usize {
    bins.partition_point(|&b| b <= x)
}

/// Monotone piecewise-cubic Hermite interpolant (Fritsch-Butland slopes).
///
/// Preserves the shape of the data: no overshoot between samples and
/// monotone segments stay monotone.
#[derive(Debug, Clone)]
pub struct Pchip {
    x: Vec<Real>,
    y: Vec<Real>,
    d: Vec<Real>,
}

impl Pchip {
    /// Build the interpolant. `x` must be strictly increasing with at least
    /// two samples.
    pub fn new(x: &[Real], y: &[Real]) -> WtResult<Self> {
        if x.len() != y.len() {
            return Err(WtError::LengthMismatch {
                what: "pchip samples",
                left: x.len(),
                right: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(WtError::InvalidArg {
                what: "pchip needs at least two samples",
            });
        }
        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(WtError::InvalidArg {
                what: "pchip abscissae must be strictly increasing",
            });
        }

        let n = x.len();
        let h: Vec<Real> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let m: Vec<Real> = y
            .windows(2)
            .zip(&h)
            .map(|(w, hk)| (w[1] - w[0]) / hk)
            .collect();

        let mut d = vec![0.0; n];
        if n == 2 {
            d[0] = m[0];
            d[1] = m[0];
        } else {
            for k in 1..n - 1 {
                if m[k - 1] * m[k] <= 0.0 {
                    d[k] = 0.0;
                } else {
                    let w1 = 2.0 * h[k] + h[k - 1];
                    let w2 = h[k] + 2.0 * h[k - 1];
                    d[k] = (w1 + w2) / (w1 / m[k - 1] + w2 / m[k]);
                }
            }
            d[0] = edge_slope(h[0], h[1], m[0], m[1]);
            d[n - 1] = edge_slope(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            d,
        })
    }

    pub fn eval(&self, xv: Real) -> Real {
        let n = self.x.len();
        let k = self.x.partition_point(|&v| v <= xv).clamp(1, n - 1);
        let (x0, x1) = (self.x[k - 1], self.x[k]);
        let h = x1 - x0;
        let t = (xv - x0) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        h00 * self.y[k - 1] + h10 * h * self.d[k - 1] + h01 * self.y[k] + h11 * h * self.d[k]
    }

    pub fn eval_many(&self, xs: &[Real]) -> Vec<Real> {
        xs.iter().map(|&xv| self.eval(xv)).collect()
    }
}

/// One-sided three-point slope estimate, limited to keep the end monotone.
fn edge_slope(h0: Real, h1: Real, m0: Real, m1: Real) -> Real {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn linspace_hits_endpoints() {
        let v = linspace(3.0, 25.0, 20);
        assert_eq!(v.len(), 20);
        assert_eq!(v[0], 3.0);
        assert_eq!(v[19], 25.0);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 9.0, 1), vec![2.0]);
    }

    #[test]
    fn interp_clamps_outside_table() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [10.0, 20.0, 40.0];
        assert_eq!(interp_linear(-1.0, &xp, &fp), 10.0);
        assert_eq!(interp_linear(5.0, &xp, &fp), 40.0);
        assert!((interp_linear(1.5, &xp, &fp) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn trapz_of_line() {
        let x = linspace(0.0, 2.0, 5);
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v).collect();
        assert!((trapz(&y, &x).unwrap() - 6.0).abs() < 1e-12);
        assert!(trapz(&y, &x[..3]).is_err());
    }

    #[test]
    fn digitize_matches_bin_edges() {
        let bins = [0.0, 730.0, 1460.0];
        assert_eq!(digitize(-1.0, &bins), 0);
        assert_eq!(digitize(0.0, &bins), 1);
        assert_eq!(digitize(729.9, &bins), 1);
        assert_eq!(digitize(730.0, &bins), 2);
        assert_eq!(digitize(5000.0, &bins), 3);
    }

    #[test]
    fn pchip_reproduces_knots_and_flat_tail() {
        let x = [3.0, 6.0, 9.0, 12.0, 15.0];
        let y = [0.1, 1.0, 3.0, 5.0, 5.0];
        let p = Pchip::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!((p.eval(*xi) - yi).abs() < 1e-12);
        }
        // Flat segment must not overshoot
        for v in linspace(12.0, 15.0, 31) {
            assert!(p.eval(v) <= 5.0 + 1e-12);
        }
    }

    #[test]
    fn pchip_rejects_duplicate_abscissae() {
        assert!(Pchip::new(&[1.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).is_err());
    }

    proptest! {
        #[test]
        fn pchip_preserves_monotone_data(steps in proptest::collection::vec(0.0f64..5.0, 3..12)) {
            let x: Vec<f64> = (0..=steps.len()).map(|i| i as f64).collect();
            let mut y = vec![0.0];
            for s in &steps {
                let last = *y.last().unwrap();
                y.push(last + s);
            }
            let p = Pchip::new(&x, &y).unwrap();
            let fine = linspace(0.0, steps.len() as f64, 200);
            let vals = p.eval_many(&fine);
            for w in vals.windows(2) {
                prop_assert!(w[1] >= w[0] - 1e-9);
            }
        }

        #[test]
        fn interp_stays_within_table(x in -10.0f64..10.0) {
            let xp = [-2.0, 0.0, 3.0, 4.0];
            let fp = [1.0, -1.0, 2.0, 0.5];
            let v = interp_linear(x, &xp, &fp);
            prop_assert!((-1.0..=2.0).contains(&v));
        }
    }
}
