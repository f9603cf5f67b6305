//! Newton solver with box constraints.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Newton solver configuration.
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 40,
            abs_tol: 1e-6,
            rel_tol: 1e-8,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
        }
    }
}

/// Elementwise lower/upper limits on the unknowns.
#[derive(Debug, Clone)]
pub struct BoxBounds {
    pub lower: DVector<f64>,
    pub upper: DVector<f64>,
}

impl BoxBounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> SolverResult<Self> {
        if lower.len() != upper.len() {
            return Err(SolverError::ProblemSetup {
                what: format!("bounds length {} vs {}", lower.len(), upper.len()),
            });
        }
        if let Some((lo, hi)) = lower.iter().zip(&upper).find(|(lo, hi)| lo > hi) {
            return Err(SolverError::InvalidBracket { lo: *lo, hi: *hi });
        }
        Ok(Self {
            lower: DVector::from_vec(lower),
            upper: DVector::from_vec(upper),
        })
    }

    /// Clamp `x` into the box.
    pub fn project(&self, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            x.len(),
            x.iter()
                .enumerate()
                .map(|(i, v)| v.clamp(self.lower[i], self.upper[i])),
        )
    }
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
    /// Converged flag
    pub converged: bool,
}

/// Newton solve of `F(x) = 0` with every iterate projected into `bounds`.
///
/// A singular Jacobian, a stalled line search or the iteration cap end the
/// search with `converged == false` and the last iterate; only errors raised
/// by the residual or Jacobian callbacks are returned as `Err`.
pub fn newton_solve_bounded<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    bounds: &BoxBounds,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> SolverResult<DMatrix<f64>>,
{
    if x0.len() != bounds.lower.len() {
        return Err(SolverError::ProblemSetup {
            what: format!("x0 length {} vs bounds {}", x0.len(), bounds.lower.len()),
        });
    }

    let mut x = bounds.project(&x0);
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    let finish = |x: DVector<f64>,
                  r_norm: f64,
                  iterations: usize,
                  converged: bool|
     -> SolverResult<NewtonResult> {
        debug!(iterations, residual = r_norm, converged, "bounded newton finished");
        Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations,
            converged,
        })
    };

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            return finish(x, r_norm, iter, true);
        }

        let jac = jacobian_fn(&x)?;
        let Some(dx) = jac.lu().solve(&(-&r)) else {
            return finish(x, r_norm, iter, false);
        };

        // Backtrack along the projected step until the residual drops
        let mut alpha = 1.0;
        let mut x_new = bounds.project(&(&x + &dx));
        let mut r_new = residual_fn(&x_new)?;
        let mut r_new_norm = r_new.norm();
        for _ in 0..config.max_line_search_iters {
            if r_new_norm < r_norm {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = bounds.project(&(&x + alpha * &dx));
            r_new = residual_fn(&x_new)?;
            r_new_norm = r_new.norm();
        }

        if !(r_new_norm < r_norm) {
            return finish(x, r_norm, iter + 1, false);
        }
        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    let converged = r_norm < config.abs_tol;
    finish(x, r_norm, config.max_iterations, converged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0 on [0, 10]
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };
        let jacobian = |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };

        let bounds = BoxBounds::new(vec![0.0], vec![10.0]).unwrap();
        let x0 = DVector::from_element(1, 3.0);
        let result =
            newton_solve_bounded(x0, residual, jacobian, &bounds, &NewtonConfig::default())
                .unwrap();

        assert!(result.converged);
        assert!((result.x[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn root_outside_box_is_not_converged() {
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] - 5.0))
        };
        let jacobian =
            |_: &DVector<f64>| -> SolverResult<DMatrix<f64>> { Ok(DMatrix::from_element(1, 1, 1.0)) };

        let bounds = BoxBounds::new(vec![0.0], vec![2.0]).unwrap();
        let result = newton_solve_bounded(
            DVector::from_element(1, 1.0),
            residual,
            jacobian,
            &bounds,
            &NewtonConfig::default(),
        )
        .unwrap();

        assert!(!result.converged);
        assert!(result.x[0] <= 2.0);
    }

    #[test]
    fn inverted_bounds_rejected() {
        assert!(BoxBounds::new(vec![1.0], vec![0.0]).is_err());
        assert!(BoxBounds::new(vec![1.0, 2.0], vec![3.0]).is_err());
    }
}
