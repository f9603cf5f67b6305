// wt-core/src/units.rs

use uom::si::f64::{
    Angle as UomAngle, AngularVelocity as UomAngularVelocity, Energy as UomEnergy,
    Force as UomForce, Length as UomLength, MassDensity as UomMassDensity, Power as UomPower,
    Time as UomTime, Torque as UomTorque, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
pub type AngularVelocity = UomAngularVelocity;
pub type Density = UomMassDensity;
pub type Energy = UomEnergy;
pub type Force = UomForce;
pub type Length = UomLength;
pub type Power = UomPower;
pub type Time = UomTime;
pub type Torque = UomTorque;
pub type Velocity = UomVelocity;

/// rad/s per rpm
pub const RPM2RS: f64 = std::f64::consts::PI / 30.0;
/// rpm per rad/s
pub const RS2RPM: f64 = 30.0 / std::f64::consts::PI;

#[inline]
pub fn rpm_to_rad_s(rpm: f64) -> f64 {
    rpm * RPM2RS
}

#[inline]
pub fn rad_s_to_rpm(omega: f64) -> f64 {
    omega * RS2RPM
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn rpm(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::revolution_per_minute;
    AngularVelocity::new::<revolution_per_minute>(v)
}

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn newtons(v: f64) -> Force {
    use uom::si::force::newton;
    Force::new::<newton>(v)
}

#[inline]
pub fn newton_meters(v: f64) -> Torque {
    use uom::si::torque::newton_meter;
    Torque::new::<newton_meter>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn kwh(v: f64) -> Energy {
    use uom::si::energy::kilowatt_hour;
    Energy::new::<kilowatt_hour>(v)
}

pub mod constants {
    pub const HOURS_PER_YEAR: f64 = 365.0 * 24.0;
    /// Hours in one financial month bin.
    pub const HOURS_PER_MONTH: f64 = 730.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _v = mps(11.4);
        let _p = watts(5.0e6);
        let _w = rpm(12.1);
        let _a = deg(3.0);
        let _f = newtons(7.0e5);
        let _q = newton_meters(4.0e6);
        let _l = m(63.0);
        let _e = kwh(1.0);
    }

    #[test]
    fn rpm_round_trip() {
        let w = rpm_to_rad_s(12.1);
        assert!((rad_s_to_rpm(w) - 12.1).abs() < 1e-12);
        assert!((rpm(30.0).value - std::f64::consts::PI).abs() < 1e-12);
    }
}
