//! Drivetrain losses: shaft power to electrical power.
//!
//! Either a closed-form efficiency polynomial keyed by drivetrain
//! architecture, or a two-column lookup table in one of four conventions.

use crate::error::{RotorError, RotorResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wt_core::interp::interp_linear;
use wt_core::numeric::{smooth_abs, smooth_min};

/// Drivetrain architecture for the polynomial loss model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrivetrainType {
    Geared,
    SingleStage,
    MultiDrive,
    PmDirectDrive,
    ConstantEff,
}

impl DrivetrainType {
    pub const ALL: [DrivetrainType; 5] = [
        DrivetrainType::Geared,
        DrivetrainType::SingleStage,
        DrivetrainType::MultiDrive,
        DrivetrainType::PmDirectDrive,
        DrivetrainType::ConstantEff,
    ];

    /// Loss polynomial `(constant, linear, quadratic)`.
    pub fn coefficients(self) -> (f64, f64, f64) {
        match self {
            DrivetrainType::Geared => (0.01289, 0.08510, 0.0),
            DrivetrainType::SingleStage => (0.01331, 0.03655, 0.06107),
            DrivetrainType::MultiDrive => (0.01547, 0.04463, 0.05790),
            DrivetrainType::PmDirectDrive => (0.01007, 0.02000, 0.06899),
            DrivetrainType::ConstantEff => (0.0, 0.07, 0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DrivetrainType::Geared => "GEARED",
            DrivetrainType::SingleStage => "SINGLE_STAGE",
            DrivetrainType::MultiDrive => "MULTI_DRIVE",
            DrivetrainType::PmDirectDrive => "PM_DIRECT_DRIVE",
            DrivetrainType::ConstantEff => "CONSTANT_EFF",
        }
    }
}

impl fmt::Display for DrivetrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrivetrainType {
    type Err = RotorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        DrivetrainType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or(RotorError::UnknownVariant {
                kind: "drivetrain type",
                name: s.to_string(),
            })
    }
}

/// Meaning of the two columns of an efficiency table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableType {
    /// Rotor speed (rpm) to efficiency
    #[serde(rename = "RPM-EFF")]
    RpmEff,
    /// Rotor speed (rpm) to electrical power (W)
    #[serde(rename = "RPM-ELEC")]
    RpmElec,
    /// Shaft power (W) to efficiency
    #[serde(rename = "MECH-EFF")]
    MechEff,
    /// Shaft power (W) to electrical power (W)
    #[serde(rename = "MECH-ELEC")]
    MechElec,
}

impl FromStr for TableType {
    type Err = RotorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RPM-EFF" => Ok(TableType::RpmEff),
            "RPM-ELEC" => Ok(TableType::RpmElec),
            "MECH-EFF" => Ok(TableType::MechEff),
            "MECH-ELEC" => Ok(TableType::MechElec),
            _ => Err(RotorError::UnknownVariant {
                kind: "drivetrain table type",
                name: s.to_string(),
            }),
        }
    }
}

/// Two-column efficiency table with an increasing first column.
#[derive(Clone, Debug, PartialEq)]
pub struct EfficiencyTable {
    x: Vec<f64>,
    y: Vec<f64>,
    kind: TableType,
}

impl EfficiencyTable {
    pub fn new(x: Vec<f64>, y: Vec<f64>, kind: TableType) -> RotorResult<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(RotorError::InvalidTable {
                what: format!("columns of length {} and {}", x.len(), y.len()),
            });
        }
        if x.windows(2).any(|w| w[1] < w[0]) {
            return Err(RotorError::InvalidTable {
                what: "first column must be increasing".into(),
            });
        }
        if x.iter().chain(&y).any(|v| !v.is_finite()) {
            return Err(RotorError::InvalidTable {
                what: "non-finite entry".into(),
            });
        }
        Ok(Self { x, y, kind })
    }

    /// Build from `[[x, y], ...]` rows.
    pub fn from_rows(rows: &[[f64; 2]], kind: TableType) -> RotorResult<Self> {
        Self::new(
            rows.iter().map(|r| r[0]).collect(),
            rows.iter().map(|r| r[1]).collect(),
            kind,
        )
    }

    pub fn kind(&self) -> TableType {
        self.kind
    }

    fn lookup(&self, at: f64) -> f64 {
        interp_linear(at, &self.x, &self.y)
    }
}

/// Shaft-to-electrical conversion.
#[derive(Clone, Debug, PartialEq)]
pub enum DrivetrainModel {
    Polynomial(DrivetrainType),
    Table(EfficiencyTable),
}

impl Default for DrivetrainModel {
    fn default() -> Self {
        DrivetrainModel::Polynomial(DrivetrainType::Geared)
    }
}

impl DrivetrainModel {
    /// Returns `(electrical_power, efficiency)`.
    ///
    /// In the polynomial mode the normalized power is passed through a smoothed
    /// absolute value and a smoothed cap at 1.0 before entering
    /// `eff = 1 - (c/P̄ + l + q·P̄)`. The table modes interpolate linearly and
    /// hold the end values outside the table. An electrical-power table at zero
    /// shaft power yields zero efficiency.
    pub fn efficiency(&self, aero_power: f64, rated_power: f64, rotor_speed_rpm: f64) -> (f64, f64) {
        let eff = match self {
            DrivetrainModel::Polynomial(kind) => {
                let (constant, linear, quadratic) = kind.coefficients();
                let pbar0 = aero_power / rated_power;
                let pbar1 = smooth_abs(pbar0, 0.01);
                let pbar = smooth_min(pbar1, 1.0, 0.01);
                1.0 - (constant / pbar + linear + quadratic * pbar)
            }
            DrivetrainModel::Table(table) => match table.kind {
                TableType::RpmEff => table.lookup(rotor_speed_rpm),
                TableType::MechEff => table.lookup(aero_power),
                TableType::RpmElec => ratio(table.lookup(rotor_speed_rpm), aero_power),
                TableType::MechElec => ratio(table.lookup(aero_power), aero_power),
            },
        };
        (aero_power * eff, eff)
    }
}

fn ratio(p_elec: f64, aero_power: f64) -> f64 {
    if aero_power.abs() < f64::EPSILON {
        0.0
    } else {
        p_elec / aero_power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn geared_efficiency_at_rated() {
        let model = DrivetrainModel::Polynomial(DrivetrainType::Geared);
        let (p, eff) = model.efficiency(5.0e6, 5.0e6, 12.1);
        // P̄ sits in the smoothing band at exactly rated power
        assert!((eff - 0.90201).abs() < 5e-4);
        assert!((p - 5.0e6 * eff).abs() < 1e-6);

        let (_, eff_above) = model.efficiency(6.0e6, 5.0e6, 12.1);
        assert!((eff_above - 0.90201).abs() < 1e-12);
    }

    #[test]
    fn constant_eff_is_flat() {
        let model = DrivetrainModel::Polynomial(DrivetrainType::ConstantEff);
        for p in [1.0e5, 1.0e6, 4.0e6, 8.0e6] {
            let (_, eff) = model.efficiency(p, 5.0e6, 10.0);
            assert!((eff - 0.93).abs() < 1e-12);
        }
    }

    #[test]
    fn parse_names_case_insensitive() {
        assert_eq!(
            "pm_direct_drive".parse::<DrivetrainType>().unwrap(),
            DrivetrainType::PmDirectDrive
        );
        assert!("hydraulic".parse::<DrivetrainType>().is_err());
        assert_eq!("mech-elec".parse::<TableType>().unwrap(), TableType::MechElec);
        assert!("rpm".parse::<TableType>().is_err());
    }

    #[test]
    fn table_modes() {
        let rpm_eff =
            EfficiencyTable::from_rows(&[[5.0, 0.90], [10.0, 0.95]], TableType::RpmEff).unwrap();
        let model = DrivetrainModel::Table(rpm_eff);
        let (p, eff) = model.efficiency(1.0e6, 5.0e6, 7.5);
        assert!((eff - 0.925).abs() < 1e-12);
        assert!((p - 0.925e6).abs() < 1e-6);
        // Clamped outside the table
        assert!((model.efficiency(1.0e6, 5.0e6, 20.0).1 - 0.95).abs() < 1e-12);

        let mech_elec = EfficiencyTable::from_rows(
            &[[0.0, 0.0], [1.0e6, 0.9e6], [5.0e6, 4.7e6]],
            TableType::MechElec,
        )
        .unwrap();
        let model = DrivetrainModel::Table(mech_elec);
        let (p, eff) = model.efficiency(3.0e6, 5.0e6, 0.0);
        assert!((p - 2.8e6).abs() < 1e-3);
        assert!((eff - 2.8 / 3.0).abs() < 1e-9);
        assert_eq!(model.efficiency(0.0, 5.0e6, 0.0), (0.0, 0.0));
    }

    #[test]
    fn table_validation() {
        assert!(EfficiencyTable::new(vec![], vec![], TableType::RpmEff).is_err());
        assert!(EfficiencyTable::new(vec![2.0, 1.0], vec![0.9, 0.9], TableType::RpmEff).is_err());
        assert!(EfficiencyTable::new(vec![1.0], vec![0.9, 0.9], TableType::RpmEff).is_err());
    }

    proptest! {
        #[test]
        fn polynomial_efficiency_is_bounded(p in 0.05f64..3.0, idx in 0usize..5) {
            let kind = DrivetrainType::ALL[idx];
            let (_, eff) = DrivetrainModel::Polynomial(kind).efficiency(p * 5.0e6, 5.0e6, 10.0);
            prop_assert!(eff < 1.0);
            prop_assert!(eff > 0.0);
        }

        #[test]
        fn electrical_power_increases_with_shaft_power(p in 0.05f64..2.0) {
            let model = DrivetrainModel::default();
            let (lo, _) = model.efficiency(p * 5.0e6, 5.0e6, 10.0);
            let (hi, _) = model.efficiency((p + 0.01) * 5.0e6, 5.0e6, 10.0);
            prop_assert!(hi > lo);
        }
    }
}
