//! Finite difference Jacobians for the multivariate solves.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Forward-difference Jacobian of `f` at `x`.
///
/// The step for column `j` is `epsilon * max(|x[j]|, 1)`.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let f_x = f(x)?;
    let mut jac = DMatrix::zeros(f_x.len(), x.len());

    for j in 0..x.len() {
        let h = epsilon * x[j].abs().max(1.0);
        let mut xp = x.clone();
        xp[j] += h;
        let col = (f(&xp)? - &f_x) / h;
        jac.set_column(j, &col);
    }

    Ok(jac)
}

/// Central-difference Jacobian; twice the evaluations of the forward variant.
pub fn central_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let m = f(x)?.len();
    let mut jac = DMatrix::zeros(m, x.len());

    for j in 0..x.len() {
        let h = epsilon * x[j].abs().max(1.0);
        let mut xp = x.clone();
        xp[j] += h;
        let mut xm = x.clone();
        xm[j] -= h;
        let col = (f(&xp)? - f(&xm)?) / (2.0 * h);
        jac.set_column(j, &col);
    }

    Ok(jac)
}
