//! Rotor file schema.
//!
//! Every section except `rotor` and `control` has defaults, so a minimal file
//! only states geometry and limits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RotorFile {
    #[serde(default = "default_name")]
    pub name: String,
    pub rotor: RotorDef,
    pub control: ControlDef,
    #[serde(default)]
    pub drivetrain: DrivetrainDef,
    #[serde(default)]
    pub power_curve: PowerCurveDef,
    #[serde(default)]
    pub aep: AepDef,
    #[serde(default)]
    pub tables: TablesDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<SurfaceDef>,
}

fn default_name() -> String {
    "rotor".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RotorDef {
    pub tip_radius_m: f64,
    #[serde(default)]
    pub hub_radius_m: f64,
    #[serde(default = "default_blades")]
    pub n_blades: usize,
    #[serde(default = "default_air_density")]
    pub air_density_kg_m3: f64,
    pub hub_height_m: f64,
}

fn default_blades() -> usize {
    3
}

fn default_air_density() -> f64 {
    1.225
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlDef {
    pub v_in_mps: f64,
    pub v_out_mps: f64,
    pub rated_power_w: f64,
    #[serde(default)]
    pub min_rotor_speed_rpm: f64,
    pub max_rotor_speed_rpm: f64,
    pub max_tip_speed_mps: f64,
    pub region2_tsr: f64,
    #[serde(default)]
    pub region2_pitch_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrivetrainDef {
    /// GEARED, SINGLE_STAGE, MULTI_DRIVE, PM_DIRECT_DRIVE or CONSTANT_EFF
    #[serde(rename = "type", default = "default_drivetrain")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<EfficiencyTableDef>,
}

impl Default for DrivetrainDef {
    fn default() -> Self {
        Self {
            kind: default_drivetrain(),
            table: None,
        }
    }
}

fn default_drivetrain() -> String {
    "GEARED".to_string()
}

/// Two-column efficiency table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EfficiencyTableDef {
    /// RPM-EFF, RPM-ELEC, MECH-EFF or MECH-ELEC
    pub table_type: String,
    pub rows: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerCurveDef {
    #[serde(default = "default_n_points")]
    pub n_points: usize,
    #[serde(default = "default_n_spline")]
    pub n_spline: usize,
    #[serde(default = "default_true")]
    pub regulate_region25: bool,
    #[serde(default = "default_true")]
    pub regulate_region3: bool,
}

impl Default for PowerCurveDef {
    fn default() -> Self {
        Self {
            n_points: default_n_points(),
            n_spline: default_n_spline(),
            regulate_region25: true,
            regulate_region3: true,
        }
    }
}

fn default_n_points() -> usize {
    20
}

fn default_n_spline() -> usize {
    200
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKindDef {
    #[default]
    Weibull,
    Rayleigh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AepDef {
    #[serde(default = "default_loss_factor")]
    pub loss_factor: f64,
    #[serde(default)]
    pub distribution: DistributionKindDef,
    /// Mean wind speed at `reference_height_m`
    #[serde(default = "default_mean_wind")]
    pub mean_wind_speed_mps: f64,
    #[serde(default = "default_weibull_k")]
    pub weibull_k: f64,
    #[serde(default = "default_shear")]
    pub shear_exponent: f64,
    /// Defaults to the hub height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_height_m: Option<f64>,
}

impl Default for AepDef {
    fn default() -> Self {
        Self {
            loss_factor: default_loss_factor(),
            distribution: DistributionKindDef::Weibull,
            mean_wind_speed_mps: default_mean_wind(),
            weibull_k: default_weibull_k(),
            shear_exponent: default_shear(),
            reference_height_m: None,
        }
    }
}

fn default_loss_factor() -> f64 {
    1.0
}

fn default_mean_wind() -> f64 {
    10.0
}

fn default_weibull_k() -> f64 {
    2.0
}

fn default_shear() -> f64 {
    0.2
}

/// Explicit grids for Cp/Ct/Cq tables. Empty vectors fall back to the
/// default linear grids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TablesDef {
    #[serde(default)]
    pub tsr: Vec<f64>,
    #[serde(default)]
    pub pitch_deg: Vec<f64>,
    #[serde(default)]
    pub wind_speed_mps: Vec<f64>,
    #[serde(default = "default_n_grid")]
    pub n_tsr: usize,
    #[serde(default = "default_n_grid")]
    pub n_pitch: usize,
    #[serde(default = "default_n_wind")]
    pub n_wind: usize,
}

impl Default for TablesDef {
    fn default() -> Self {
        Self {
            tsr: Vec::new(),
            pitch_deg: Vec::new(),
            wind_speed_mps: Vec::new(),
            n_tsr: default_n_grid(),
            n_pitch: default_n_grid(),
            n_wind: default_n_wind(),
        }
    }
}

fn default_n_grid() -> usize {
    20
}

fn default_n_wind() -> usize {
    1
}

/// Parameters of the closed-form Cp(λ, β) surface used by the parametric
/// rotor. Omitted fields keep the reference values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurfaceDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cp_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsr_opt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsr_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_per_tsr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_width_deg: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_rotor_file_gets_defaults() {
        let yaml = r#"
rotor:
  tip_radius_m: 63.0
  hub_height_m: 90.0
control:
  v_in_mps: 3.0
  v_out_mps: 25.0
  rated_power_w: 5.0e6
  max_rotor_speed_rpm: 12.1
  max_tip_speed_mps: 80.0
  region2_tsr: 7.55
"#;
        let f: RotorFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(f.name, "rotor");
        assert_eq!(f.rotor.n_blades, 3);
        assert_eq!(f.rotor.air_density_kg_m3, 1.225);
        assert_eq!(f.drivetrain.kind, "GEARED");
        assert!(f.drivetrain.table.is_none());
        assert_eq!(f.power_curve, PowerCurveDef::default());
        assert_eq!(f.aep.loss_factor, 1.0);
        assert_eq!(f.aep.distribution, DistributionKindDef::Weibull);
        assert_eq!(f.tables.n_tsr, 20);
        assert_eq!(f.tables.n_wind, 1);
        assert!(f.surface.is_none());
    }

    #[test]
    fn drivetrain_table_parses() {
        let yaml = r#"
type: constant_eff
table:
  table_type: RPM-EFF
  rows: [[0.0, 0.9], [12.0, 0.95]]
"#;
        let d: DrivetrainDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(d.kind, "constant_eff");
        let t = d.table.unwrap();
        assert_eq!(t.table_type, "RPM-EFF");
        assert_eq!(t.rows[1], [12.0, 0.95]);
    }
}
