//! Integration tests for the bounded search routines.

use nalgebra::{DMatrix, DVector};
use proptest::prelude::*;
use wt_solver::{
    BoxBounds, BracketConfig, NewtonConfig, SolverResult, brentq, finite_difference_jacobian,
    maximize_bounded, minimize_bounded, newton_solve_bounded,
};

/// Smooth single-peaked curve resembling power against blade pitch.
fn peaked(pitch: f64) -> f64 {
    let x = pitch + 0.8;
    5.0e6 * (-0.02 * x * x).exp()
}

#[test]
fn maximize_peaked_curve_from_warm_start() {
    let pitch0 = 1.0;
    let res = maximize_bounded(|p| Ok(peaked(p)), pitch0 - 10.0, pitch0 + 10.0, 1e-2, 40).unwrap();
    assert!((res.x + 0.8).abs() < 2e-2);
}

#[test]
fn brentq_then_fallback_to_abs_minimization() {
    let cfg = BracketConfig::default();
    // Residual never crosses zero in the bracket
    let res = |p: f64| -> SolverResult<f64> { Ok(peaked(p) - 6.0e6) };
    assert!(brentq(res, 0.0, 10.0, &cfg).is_err());

    let fallback = minimize_bounded(|p| res(p).map(f64::abs), -5.0, 15.0, 1e-3, 40).unwrap();
    assert!((fallback.x + 0.8).abs() < 1e-2);
}

#[test]
fn joint_stationary_point_and_level() {
    // g(a, b) = -(a - 1)^2 + b; solve dg/da = 0 and g = 2
    let g = |a: f64, b: f64| -(a - 1.0) * (a - 1.0) + b;
    let residual = move |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
        let h = 1e-6;
        let dg = (g(x[0] + h, x[1]) - g(x[0] - h, x[1])) / (2.0 * h);
        Ok(DVector::from_vec(vec![dg, g(x[0], x[1]) - 2.0]))
    };
    let jac = move |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
        finite_difference_jacobian(x, residual, 1e-6)
    };
    let bounds = BoxBounds::new(vec![-5.0, 0.0], vec![5.0, 10.0]).unwrap();
    let out = newton_solve_bounded(
        DVector::from_vec(vec![0.0, 1.0]),
        residual,
        jac,
        &bounds,
        &NewtonConfig::default(),
    )
    .unwrap();
    assert!(out.converged);
    assert!((out.x[0] - 1.0).abs() < 1e-4);
    assert!((out.x[1] - 2.0).abs() < 1e-4);
}

proptest! {
    #[test]
    fn minimizer_stays_in_bounds(lo in -50.0f64..0.0, width in 0.1f64..50.0, c in -100.0f64..100.0) {
        let hi = lo + width;
        let res = minimize_bounded(|x| Ok((x - c).powi(2)), lo, hi, 1e-4, 60).unwrap();
        prop_assert!(res.x >= lo && res.x <= hi);
        let expected = c.clamp(lo, hi);
        prop_assert!((res.x - expected).abs() < 1e-2 * width.max(1.0));
    }

    #[test]
    fn brentq_root_of_shifted_cubic(shift in -3.0f64..3.0) {
        let res = brentq(|x| Ok((x - shift).powi(3)), -5.0, 5.0, &BracketConfig {
            xtol: 1e-10,
            rtol: 1e-10,
            max_iterations: 200,
        }).unwrap();
        prop_assert!((res.x - shift).abs() < 1e-3);
    }
}
