//! Bracketed one-dimensional search: bounded minimization and root finding.
//!
//! Both routines are derivative-free Brent methods and evaluate the objective
//! at most `maxiter` (plus the initial) times.

use crate::error::{SolverError, SolverResult};
use tracing::trace;

const GOLDEN_MEAN: f64 = 0.381_966_011_250_105_1; // (3 - sqrt 5) / 2

/// Result of a bounded scalar minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarMin {
    /// Best abscissa found
    pub x: f64,
    /// Objective at `x`
    pub fx: f64,
    /// Number of objective evaluations
    pub evaluations: usize,
    pub converged: bool,
}

/// Result of a bracketed root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarRoot {
    pub x: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Termination settings for [`brentq`].
#[derive(Debug, Clone, Copy)]
pub struct BracketConfig {
    /// Absolute tolerance on the root
    pub xtol: f64,
    /// Relative tolerance on the root
    pub rtol: f64,
    pub max_iterations: usize,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            xtol: 1e-4,
            rtol: 1e-5,
            max_iterations: 40,
        }
    }
}

/// Minimize `f` on `[lo, hi]` with Brent's golden-section/parabolic method.
///
/// Stops when the bracket shrinks below `xatol` or after `maxiter`
/// evaluations; in the latter case `converged` is false and the best point
/// seen so far is returned.
pub fn minimize_bounded<F>(
    mut f: F,
    lo: f64,
    hi: f64,
    xatol: f64,
    maxiter: usize,
) -> SolverResult<ScalarMin>
where
    F: FnMut(f64) -> SolverResult<f64>,
{
    if !(lo.is_finite() && hi.is_finite()) || lo > hi {
        return Err(SolverError::InvalidBracket { lo, hi });
    }
    let sqrt_eps = 2.2e-16_f64.sqrt();
    let maxfun = maxiter.max(1);

    let (mut a, mut b) = (lo, hi);
    let mut fulc = a + GOLDEN_MEAN * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat = 0.0_f64;
    let mut e = 0.0_f64;
    let mut fx = f(xf)?;
    let mut num = 1;
    let mut ffulc = fx;
    let mut fnfc = fx;
    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * xf.abs() + xatol / 3.0;
    let mut tol2 = 2.0 * tol1;
    let mut converged = true;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        let mut golden = true;

        if e.abs() > tol1 {
            golden = false;
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                let x = xf + rat;
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * sign_or_one(xm - xf);
                }
            } else {
                golden = true;
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = GOLDEN_MEAN * e;
        }

        let x = xf + sign_or_one(rat) * rat.abs().max(tol1);
        let fu = f(x)?;
        num += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = nfc;
                ffulc = fnfc;
                nfc = x;
                fnfc = fu;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * xf.abs() + xatol / 3.0;
        tol2 = 2.0 * tol1;

        if num >= maxfun {
            converged = (xf - xm).abs() <= tol2 - 0.5 * (b - a);
            break;
        }
    }

    trace!(x = xf, fx, evaluations = num, converged, "bounded minimization");
    Ok(ScalarMin {
        x: xf,
        fx,
        evaluations: num,
        converged,
    })
}

/// Maximize `f` on `[lo, hi]`. The returned `fx` is the maximum value.
pub fn maximize_bounded<F>(
    mut f: F,
    lo: f64,
    hi: f64,
    xatol: f64,
    maxiter: usize,
) -> SolverResult<ScalarMin>
where
    F: FnMut(f64) -> SolverResult<f64>,
{
    let min = minimize_bounded(|x| f(x).map(|v| -v), lo, hi, xatol, maxiter)?;
    Ok(ScalarMin { fx: -min.fx, ..min })
}

/// Find a root of `f` in `[a, b]` with Brent's method.
///
/// Fails with [`SolverError::NoSignChange`] when `f(a)` and `f(b)` share a
/// sign. Running out of iterations is not an error: the current best estimate
/// comes back with `converged == false`.
pub fn brentq<F>(mut f: F, a: f64, b: f64, config: &BracketConfig) -> SolverResult<ScalarRoot>
where
    F: FnMut(f64) -> SolverResult<f64>,
{
    if !(a.is_finite() && b.is_finite()) {
        return Err(SolverError::InvalidBracket { lo: a, hi: b });
    }

    let mut xpre = a;
    let mut xcur = b;
    let mut fpre = f(xpre)?;
    let mut fcur = f(xcur)?;
    let mut xblk = 0.0;
    let mut fblk = 0.0;
    let mut spre = 0.0;
    let mut scur = 0.0;

    if fpre * fcur > 0.0 {
        return Err(SolverError::NoSignChange {
            a,
            b,
            fa: fpre,
            fb: fcur,
        });
    }
    if fpre == 0.0 {
        return Ok(ScalarRoot {
            x: xpre,
            iterations: 0,
            converged: true,
        });
    }
    if fcur == 0.0 {
        return Ok(ScalarRoot {
            x: xcur,
            iterations: 0,
            converged: true,
        });
    }

    for iter in 0..config.max_iterations {
        if fpre != 0.0 && fcur != 0.0 && fpre.is_sign_negative() != fcur.is_sign_negative() {
            xblk = xpre;
            fblk = fpre;
            spre = xcur - xpre;
            scur = spre;
        }
        if fblk.abs() < fcur.abs() {
            xpre = xcur;
            xcur = xblk;
            xblk = xpre;
            fpre = fcur;
            fcur = fblk;
            fblk = fpre;
        }

        let delta = 0.5 * (config.xtol + config.rtol * xcur.abs());
        let sbis = 0.5 * (xblk - xcur);
        if fcur == 0.0 || sbis.abs() < delta {
            return Ok(ScalarRoot {
                x: xcur,
                iterations: iter,
                converged: true,
            });
        }

        if spre.abs() > delta && fcur.abs() < fpre.abs() {
            let stry = if xpre == xblk {
                // secant
                -fcur * (xcur - xpre) / (fcur - fpre)
            } else {
                // inverse quadratic
                let dpre = (fpre - fcur) / (xpre - xcur);
                let dblk = (fblk - fcur) / (xblk - xcur);
                -fcur * (fblk * dblk - fpre * dpre) / (dblk * dpre * (fblk - fpre))
            };
            if 2.0 * stry.abs() < spre.abs().min(3.0 * sbis.abs() - delta) {
                spre = scur;
                scur = stry;
            } else {
                spre = sbis;
                scur = sbis;
            }
        } else {
            spre = sbis;
            scur = sbis;
        }

        xpre = xcur;
        fpre = fcur;
        if scur.abs() > delta {
            xcur += scur;
        } else {
            xcur += if sbis > 0.0 { delta } else { -delta };
        }
        fcur = f(xcur)?;
    }

    trace!(x = xcur, "brentq hit iteration cap");
    Ok(ScalarRoot {
        x: xcur,
        iterations: config.max_iterations,
        converged: false,
    })
}

fn sign_or_one(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_parabola() {
        let res = minimize_bounded(|x| Ok((x - 1.3) * (x - 1.3)), -5.0, 5.0, 1e-5, 500).unwrap();
        assert!(res.converged);
        assert!((res.x - 1.3).abs() < 1e-4);
    }

    #[test]
    fn minimum_on_boundary() {
        let res = minimize_bounded(|x| Ok(x), 2.0, 4.0, 1e-5, 500).unwrap();
        assert!((res.x - 2.0).abs() < 1e-3);
    }

    #[test]
    fn respects_evaluation_cap() {
        let mut calls = 0;
        let res = minimize_bounded(
            |x| {
                calls += 1;
                Ok((x - 0.123).powi(2))
            },
            -100.0,
            100.0,
            1e-12,
            5,
        )
        .unwrap();
        assert_eq!(calls, 5);
        assert_eq!(res.evaluations, 5);
        assert!(!res.converged);
    }

    #[test]
    fn maximize_flips_sign() {
        let res = maximize_bounded(|x| Ok(4.0 - (x - 2.0).powi(2)), 0.0, 3.0, 1e-6, 200).unwrap();
        assert!((res.x - 2.0).abs() < 1e-4);
        assert!((res.fx - 4.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_reversed_bounds() {
        let err = minimize_bounded(|x| Ok(x), 1.0, 0.0, 1e-5, 10).unwrap_err();
        assert!(matches!(err, SolverError::InvalidBracket { .. }));
    }

    #[test]
    fn brentq_finds_sqrt_two() {
        let cfg = BracketConfig {
            xtol: 1e-12,
            rtol: 1e-12,
            max_iterations: 100,
        };
        let root = brentq(|x| Ok(x * x - 2.0), 0.0, 2.0, &cfg).unwrap();
        assert!(root.converged);
        assert!((root.x - std::f64::consts::SQRT_2).abs() < 1e-10);
    }

    #[test]
    fn brentq_reports_missing_sign_change() {
        let err = brentq(|x| Ok(x * x + 1.0), -1.0, 1.0, &BracketConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::NoSignChange { .. }));
    }

    #[test]
    fn brentq_endpoint_root() {
        let root = brentq(|x| Ok(x - 3.0), 3.0, 5.0, &BracketConfig::default()).unwrap();
        assert_eq!(root.x, 3.0);
    }

    #[test]
    fn objective_errors_propagate() {
        let err = brentq(
            |_| {
                Err(SolverError::Backend {
                    message: "oracle".into(),
                })
            },
            0.0,
            1.0,
            &BracketConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::Backend { .. }));
    }
}
