//! Contract checks any oracle used by the rotor solvers must satisfy.

use proptest::prelude::*;
use wt_aero::{AeroError, AeroOracle, ParametricRotor};

#[test]
fn vectorized_matches_scalar_calls() {
    let rotor = ParametricRotor::reference_5mw();
    let wind = [4.0, 8.0, 12.0, 20.0];
    let rpm = [6.9, 9.2, 12.1, 12.1];
    let pitch = [0.0, 0.0, 3.0, 15.0];

    let batch = rotor.evaluate(&wind, &rpm, &pitch, true).unwrap();
    assert_eq!(batch.len(), wind.len());
    for i in 0..wind.len() {
        let single = rotor.evaluate_point(wind[i], rpm[i], pitch[i]).unwrap();
        assert_eq!(batch[i], single);
    }
}

#[test]
fn mismatched_inputs_are_errors() {
    let rotor = ParametricRotor::reference_5mw();
    let err = rotor
        .evaluate(&[4.0, 5.0], &[7.0, 7.0], &[0.0], false)
        .unwrap_err();
    assert!(matches!(err, AeroError::LengthMismatch { .. }));
}

#[test]
fn pitching_past_optimum_sheds_power() {
    let rotor = ParametricRotor::reference_5mw();
    let mut last = f64::INFINITY;
    for pitch in [2.0, 6.0, 10.0, 14.0, 18.0] {
        let p = rotor.evaluate_point(18.0, 12.1, pitch).unwrap().loads.power;
        assert!(p < last);
        last = p;
    }
}

proptest! {
    #[test]
    fn coefficients_stay_physical(u in 0.5f64..30.0, rpm in 0.0f64..15.0, pitch in -10.0f64..30.0) {
        let rotor = ParametricRotor::reference_5mw();
        let s = rotor.evaluate_point(u, rpm, pitch).unwrap();
        let c = s.coefficients.unwrap();
        prop_assert!(c.cp >= 0.0 && c.cp < 16.0 / 27.0);
        prop_assert!(c.ct >= 0.0 && c.ct <= 8.0 / 9.0 + 1e-9);
        prop_assert!(s.loads.thrust >= 0.0);
        prop_assert!(s.loads.power.is_finite());
    }
}
