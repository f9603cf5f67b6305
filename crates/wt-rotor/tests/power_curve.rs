//! Power-curve solves against the 5 MW reference rotor.

use proptest::prelude::*;
use wt_aero::ParametricRotor;
use wt_rotor::{
    AepIntegrator, ControlLimits, DrivetrainModel, DrivetrainType, PowerCurve, PowerCurveOptions,
    PowerCurveSolver, Region, WindDistribution,
};

const RATED: f64 = 5.0e6;
const RADIUS: f64 = 63.0;

fn limits() -> ControlLimits {
    ControlLimits::from_raw(3.0, 25.0, RATED, 6.9, 12.1, 80.0, 7.55, 0.0)
}

fn solve_with(limits: ControlLimits, options: PowerCurveOptions) -> PowerCurve {
    let rotor = ParametricRotor::reference_5mw();
    let drivetrain = DrivetrainModel::Polynomial(DrivetrainType::Geared);
    PowerCurveSolver::new(&rotor, &drivetrain, limits, options)
        .solve()
        .unwrap()
}

fn solve() -> PowerCurve {
    solve_with(limits(), PowerCurveOptions::default())
}

fn cap_rpm(limits: &ControlLimits) -> f64 {
    let raw_max = limits
        .max_rotor_speed
        .get::<uom::si::angular_velocity::revolution_per_minute>();
    let tip = limits
        .max_tip_speed
        .get::<uom::si::velocity::meter_per_second>()
        / RADIUS
        * 30.0
        / std::f64::consts::PI;
    raw_max.min(tip)
}

#[test]
fn region_boundaries_are_ordered() {
    let pc = solve();
    let b = pc.boundaries;
    assert!(b.region3);
    assert!(b.i_2p5 <= b.i_rated);
    assert!(b.i_rated < b.i_3);
    assert!(b.i_3 <= pc.points.len());
    assert_eq!(pc.points.len(), 20);
    assert_eq!(pc.points[b.i_rated].region, Region::Rated);
}

#[test]
fn rated_conditions_are_plausible() {
    let pc = solve();
    let v = pc.rated.wind_speed_mps();
    assert!(v > 11.0 && v < 12.3, "rated wind speed {v}");
    assert!((pc.rated.rotor_speed_rpm() - 12.1).abs() < 1e-6);
    assert!(pc.rated.thrust_n() > 0.0);
    assert!(pc.rated.torque_nm() > 0.0);
    assert_eq!(pc.points[pc.boundaries.i_rated].wind_speed, v);

    // Region 2.5 starts where tip-speed-ratio tracking reaches 12.1 rpm
    let v25 = pc.v_region25.unwrap();
    let expected = 12.1 * std::f64::consts::PI / 30.0 * RADIUS / 7.55;
    assert!((v25 - expected).abs() < 1e-9);
    assert!(v25 < v);
}

#[test]
fn electrical_power_monotone_then_rated() {
    let pc = solve();
    let i_rated = pc.boundaries.i_rated;
    let p = pc.electrical_power();
    for w in p[..=i_rated].windows(2) {
        assert!(w[1] >= w[0] - 1e-6 * RATED, "{} then {}", w[0], w[1]);
    }
    for &pi in &p[i_rated..] {
        assert_eq!(pi, RATED);
    }
    for pt in &pc.points[..i_rated] {
        assert!(pt.electrical_power < RATED);
    }
}

#[test]
fn region3_pitch_increases_with_wind() {
    let pc = solve();
    let pts = &pc.points[pc.boundaries.i_3..];
    assert!(!pts.is_empty());
    for w in pts.windows(2) {
        assert!(w[1].pitch > w[0].pitch);
    }
    // Actual oracle output holds rated power within the root tolerance
    let rotor = ParametricRotor::reference_5mw();
    let dt = DrivetrainModel::Polynomial(DrivetrainType::Geared);
    for pt in pts {
        let s = wt_aero::AeroOracle::evaluate_point(&rotor, pt.wind_speed, pt.rotor_speed, pt.pitch)
            .unwrap();
        let (p, _) = dt.efficiency(s.loads.power, RATED, pt.rotor_speed);
        assert!((p - RATED).abs() < 1e-2 * RATED);
    }
}

#[test]
fn unregulated_region3_is_trivial() {
    let opts = PowerCurveOptions {
        regulate_region3: false,
        ..PowerCurveOptions::default()
    };
    let pc = solve_with(limits(), opts);
    for pt in &pc.points[pc.boundaries.i_3..] {
        assert_eq!(pt.thrust, 0.0);
        assert_eq!(pt.root_moment, 0.0);
        assert_eq!(pt.pitch, 0.0);
        assert_eq!(pt.ct, 0.0);
        // Shaft power stays at the unregulated oracle value
        assert!(pt.aero_power > 0.0);
        assert_ne!(pt.aero_power, RATED);
        let omega = pt.rotor_speed * std::f64::consts::PI / 30.0;
        assert!((pt.torque - RATED / omega).abs() < 1e-6);
        let avail = 0.5 * 1.225 * std::f64::consts::PI * RADIUS * RADIUS * pt.wind_speed.powi(3);
        assert!((pt.cp_elec - RATED / avail).abs() < 1e-12);
    }
}

#[test]
fn rated_crossing_in_last_cell() {
    let lim = ControlLimits::from_raw(3.0, 11.8, RATED, 6.9, 12.1, 80.0, 7.55, 0.0);
    let pc = solve_with(lim, PowerCurveOptions::default());
    let n = pc.points.len();
    let b = pc.boundaries;
    assert!(b.region3);
    assert_eq!(b.i_rated, n - 1);
    assert_eq!(b.i_3, n);

    let v = pc.rated.wind_speed_mps();
    let below = 3.0 + (n - 2) as f64 * (11.8 - 3.0) / (n - 1) as f64;
    assert!(v > below && v < 11.8, "rated wind speed {v}");
    let rated = pc.points[n - 1];
    assert_eq!(rated.region, Region::Rated);
    assert_eq!(rated.wind_speed, v);
    assert_eq!(rated.electrical_power, RATED);

    // Same crossing as with a grid that runs past it
    let wide = ControlLimits::from_raw(3.0, 12.2, RATED, 6.9, 12.1, 80.0, 7.55, 0.0);
    let reference = solve_with(wide, PowerCurveOptions::default());
    assert!((reference.rated.wind_speed_mps() - v).abs() < 0.1);
}

#[test]
fn never_reaching_rated() {
    let lim = ControlLimits::from_raw(3.0, 25.0, 20.0e6, 6.9, 12.1, 80.0, 7.55, 0.0);
    let pc = solve_with(lim, PowerCurveOptions::default());
    let n = pc.points.len();
    assert!(!pc.boundaries.region3);
    assert_eq!(pc.boundaries.i_3, n);
    assert_eq!(pc.boundaries.i_rated, n - 1);
    assert_eq!(pc.rated.wind_speed_mps(), 25.0);
    assert!(pc.points.iter().all(|p| p.electrical_power < 20.0e6));
    assert!(pc.points.iter().all(|p| p.region != Region::Region3));
}

#[test]
fn without_region25_regulation_rated_uses_zero_pitch() {
    let opts = PowerCurveOptions {
        regulate_region25: false,
        ..PowerCurveOptions::default()
    };
    let pc = solve_with(limits(), opts);
    let rated = pc.points[pc.boundaries.i_rated];
    assert_eq!(rated.pitch, 0.0);
    assert_eq!(rated.electrical_power, RATED);
    // Below rated nothing was pitched
    assert!(pc.points[..pc.boundaries.i_rated].iter().all(|p| p.pitch == 0.0));
}

#[test]
fn spline_and_cutin_outputs() {
    let pc = solve();
    assert_eq!(pc.v_spline.len(), 200);
    assert_eq!(pc.v_spline[0], 3.0);
    assert_eq!(pc.v_spline[199], 25.0);
    assert!(pc.p_spline.iter().all(|p| *p <= RATED * (1.0 + 1e-12)));
    assert_eq!(pc.cutin_loads.r.len(), 17);
    let margin = pc.cutin_stall_margin(0.0, 0.1).unwrap();
    assert_eq!(margin.len(), 17);
    assert_eq!(margin[0], 0.0);
}

#[test]
fn aep_of_reference_curve() {
    let pc = solve();
    let integ = AepIntegrator::new(WindDistribution::Rayleigh { mean: 8.5 }, 1.0).unwrap();
    let e = integ.integrate(&pc).unwrap();
    let mwh = e.get::<uom::si::energy::kilowatt_hour>() / 1.0e3;
    // Roughly 40-50 % capacity factor for a 5 MW machine at 8.5 m/s
    assert!(mwh > 0.3 * 5.0 * 8760.0 && mwh < 0.6 * 5.0 * 8760.0, "AEP {mwh} MWh");
}

#[test]
fn invalid_limits_rejected() {
    let rotor = ParametricRotor::reference_5mw();
    let dt = DrivetrainModel::default();
    let bad = ControlLimits::from_raw(10.0, 5.0, RATED, 6.9, 12.1, 80.0, 7.55, 0.0);
    assert!(PowerCurveSolver::new(&rotor, &dt, bad, PowerCurveOptions::default()).solve().is_err());
    let opts = PowerCurveOptions {
        n_points: 1,
        ..PowerCurveOptions::default()
    };
    assert!(PowerCurveSolver::new(&rotor, &dt, limits(), opts).solve().is_err());
    // Minimum speed above the tip-speed limit
    let tip = ControlLimits::from_raw(3.0, 25.0, RATED, 13.0, 14.0, 60.0, 7.55, 0.0);
    assert!(PowerCurveSolver::new(&rotor, &dt, tip, PowerCurveOptions::default()).solve().is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn rotor_speed_within_limits(
        min_rpm in 3.0f64..7.0,
        max_rpm in 9.0f64..14.0,
        tip in 70.0f64..95.0,
        tsr in 6.5f64..9.0,
    ) {
        let lim = ControlLimits::from_raw(3.0, 25.0, RATED, min_rpm, max_rpm, tip, tsr, 0.0);
        let pc = solve_with(lim, PowerCurveOptions { n_points: 12, n_spline: 50, ..PowerCurveOptions::default() });
        let cap = cap_rpm(&lim);
        for pt in &pc.points {
            prop_assert!(pt.rotor_speed <= cap + 1e-9);
            prop_assert!(pt.rotor_speed >= min_rpm - 1e-9);
        }
    }
}
