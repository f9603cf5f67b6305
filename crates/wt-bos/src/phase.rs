//! Phase registry.
//!
//! Phase names resolve by the text before the first `_` or space, so
//! `TurbineInstallation_2` runs a second turbine installation with its own
//! configuration section.

use crate::error::{BosError, BosResult};
use crate::log::PhaseLog;
use crate::weather::WeatherProfile;
use crate::{design, install};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseCategory {
    Design,
    Install,
}

impl PhaseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseCategory::Design => "design",
            PhaseCategory::Install => "install",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    ProjectDevelopment,
    MonopileDesign,
    ArraySystemDesign,
    CustomArraySystemDesign,
    ExportSystemDesign,
    ScourProtectionDesign,
    OffshoreSubstationDesign,
    MonopileInstallation,
    TurbineInstallation,
    OffshoreSubstationInstallation,
    ArrayCableInstallation,
    ExportCableInstallation,
    ScourProtectionInstallation,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 13] = [
        PhaseKind::ProjectDevelopment,
        PhaseKind::MonopileDesign,
        PhaseKind::ArraySystemDesign,
        PhaseKind::CustomArraySystemDesign,
        PhaseKind::ExportSystemDesign,
        PhaseKind::ScourProtectionDesign,
        PhaseKind::OffshoreSubstationDesign,
        PhaseKind::MonopileInstallation,
        PhaseKind::TurbineInstallation,
        PhaseKind::OffshoreSubstationInstallation,
        PhaseKind::ArrayCableInstallation,
        PhaseKind::ExportCableInstallation,
        PhaseKind::ScourProtectionInstallation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::ProjectDevelopment => "ProjectDevelopment",
            PhaseKind::MonopileDesign => "MonopileDesign",
            PhaseKind::ArraySystemDesign => "ArraySystemDesign",
            PhaseKind::CustomArraySystemDesign => "CustomArraySystemDesign",
            PhaseKind::ExportSystemDesign => "ExportSystemDesign",
            PhaseKind::ScourProtectionDesign => "ScourProtectionDesign",
            PhaseKind::OffshoreSubstationDesign => "OffshoreSubstationDesign",
            PhaseKind::MonopileInstallation => "MonopileInstallation",
            PhaseKind::TurbineInstallation => "TurbineInstallation",
            PhaseKind::OffshoreSubstationInstallation => "OffshoreSubstationInstallation",
            PhaseKind::ArrayCableInstallation => "ArrayCableInstallation",
            PhaseKind::ExportCableInstallation => "ExportCableInstallation",
            PhaseKind::ScourProtectionInstallation => "ScourProtectionInstallation",
        }
    }

    pub fn category(self) -> PhaseCategory {
        match self {
            PhaseKind::ProjectDevelopment
            | PhaseKind::MonopileDesign
            | PhaseKind::ArraySystemDesign
            | PhaseKind::CustomArraySystemDesign
            | PhaseKind::ExportSystemDesign
            | PhaseKind::ScourProtectionDesign
            | PhaseKind::OffshoreSubstationDesign => PhaseCategory::Design,
            _ => PhaseCategory::Install,
        }
    }

    /// Resolve a phase instance name such as `"MonopileInstallation_2"`.
    pub fn find_key_match(target: &str) -> Option<PhaseKind> {
        let prefix = target.split(['_', ' ']).next().unwrap_or(target);
        PhaseKind::ALL.into_iter().find(|k| k.name() == prefix)
    }

    pub fn resolve(target: &str) -> BosResult<PhaseKind> {
        PhaseKind::find_key_match(target).ok_or_else(|| BosError::PhaseNotFound {
            names: vec![target.to_string()],
        })
    }

    /// Configuration the phase reads, with a description of each value.
    pub fn expected_config(self) -> Value {
        match self {
            PhaseKind::ProjectDevelopment => json!({
                "project_development": {
                    "site_auction_cost": "USD (optional, default: 100e6)",
                    "site_auction_duration": "h (optional, default: 0)",
                    "site_assessment_plan_cost": "USD (optional, default: 0.5e6)",
                    "site_assessment_plan_duration": "h (optional, default: 8760)",
                    "site_assessment_cost": "USD (optional, default: 50e6)",
                    "site_assessment_duration": "h (optional, default: 43800)",
                    "construction_operations_plan_cost": "USD (optional, default: 1e6)",
                    "construction_operations_plan_duration": "h (optional, default: 43800)",
                    "design_install_plan_cost": "USD (optional, default: 0.25e6)",
                    "design_install_plan_duration": "h (optional, default: 8760)"
                }
            }),
            PhaseKind::MonopileDesign => json!({
                "site": {"depth": "m"},
                "plant": {"num_turbines": "int"},
                "turbine": {
                    "rotor_diameter": "m",
                    "hub_height": "m",
                    "rated_windspeed": "m/s"
                },
                "monopile_design": {
                    "steel_cost": "USD/t (optional, default: 3000)",
                    "tp_steel_cost": "USD/t (optional, default: 3000)",
                    "air_gap": "m (optional, default: 10)"
                }
            }),
            PhaseKind::ArraySystemDesign => json!({
                "plant": {
                    "num_turbines": "int",
                    "turbine_spacing": "rotor diameters",
                    "row_spacing": "rotor diameters (optional, default: turbine_spacing)"
                },
                "turbine": {"rotor_diameter": "m", "turbine_rating": "MW"},
                "array_system_design": {
                    "cable_capacity": "MW (optional, default: 40)",
                    "cable_cost": "USD/km (optional, default: 400000)"
                }
            }),
            PhaseKind::CustomArraySystemDesign => json!({
                "plant": {"num_turbines": "int"},
                "array_system_design": {
                    "turbines_per_string": "list of int",
                    "string_lengths": "list of km",
                    "cable_cost": "USD/km (optional, default: 400000)"
                }
            }),
            PhaseKind::ExportSystemDesign => json!({
                "plant": {"capacity": "MW"},
                "site": {"distance_to_landfall": "km"},
                "export_system_design": {
                    "cable_capacity": "MW (optional, default: 250)",
                    "cable_cost": "USD/km (optional, default: 800000)",
                    "percent_added_length": "float (optional, default: 0.0)"
                }
            }),
            PhaseKind::ScourProtectionDesign => json!({
                "plant": {"num_turbines": "int"},
                "monopile": {"diameter": "m"},
                "scour_protection_design": {
                    "cost_per_tonne": "USD/t (optional, default: 40)",
                    "rock_density": "kg/m^3 (optional, default: 2600)",
                    "design_time": "h (optional, default: 0)",
                    "soil_friction_angle": "deg (optional, default: 33.5)",
                    "scour_depth_equilibrium": "float (optional, default: 1.3)",
                    "scour_protection_depth": "m (optional, default: 1)"
                }
            }),
            PhaseKind::OffshoreSubstationDesign => json!({
                "plant": {"capacity": "MW"},
                "site": {"depth": "m"},
                "substation_design": {
                    "substation_capacity": "MW (optional, default: 800)",
                    "topside_cost_rate": "USD/t (optional, default: 7250)",
                    "substructure_steel_cost": "USD/t (optional, default: 3000)"
                }
            }),
            PhaseKind::MonopileInstallation => json!({
                "wtiv": "vessel name or mapping (optional, default: example_wtiv)",
                "site": {"depth": "m", "distance": "km"},
                "plant": {"num_turbines": "int"},
                "port": {"monthly_rate": "USD/month (optional, default: 0)"},
                "monopile": {"length": "m", "diameter": "m", "weight": "t", "deck_space": "m^2"},
                "transition_piece": {"weight": "t", "deck_space": "m^2"}
            }),
            PhaseKind::TurbineInstallation => json!({
                "wtiv": "vessel name or mapping (optional, default: example_wtiv)",
                "site": {"depth": "m", "distance": "km"},
                "plant": {"num_turbines": "int"},
                "port": {"monthly_rate": "USD/month (optional, default: 0)"},
                "turbine": {
                    "hub_height": "m",
                    "tower_weight": "t (optional, default: 400)",
                    "nacelle_weight": "t (optional, default: 400)",
                    "blade_weight": "t (optional, default: 50)",
                    "deck_space": "m^2 per turbine (optional, default: 1000)"
                }
            }),
            PhaseKind::OffshoreSubstationInstallation => json!({
                "oss_install_vessel": "vessel name or mapping (optional, default: example_heavy_lift_vessel)",
                "site": {"depth": "m", "distance": "km"},
                "port": {"monthly_rate": "USD/month (optional, default: 0)"},
                "offshore_substation": {"num_substations": "int", "topside_mass": "t", "substructure_mass": "t"}
            }),
            PhaseKind::ArrayCableInstallation => json!({
                "array_cable_install_vessel": "vessel name or mapping (optional, default: example_cable_lay_vessel)",
                "site": {"distance": "km"},
                "port": {"monthly_rate": "USD/month (optional, default: 0)"},
                "array_system": {"num_strings": "int", "turbines_per_string": "list of int", "string_lengths": "list of km"}
            }),
            PhaseKind::ExportCableInstallation => json!({
                "export_cable_install_vessel": "vessel name or mapping (optional, default: example_cable_lay_vessel)",
                "site": {"distance": "km"},
                "port": {"monthly_rate": "USD/month (optional, default: 0)"},
                "export_system": {"num_cables": "int", "cable_length": "km"}
            }),
            PhaseKind::ScourProtectionInstallation => json!({
                "scour_protection_install_vessel": "vessel name or mapping (optional, default: example_scour_protection_vessel)",
                "site": {"distance": "km"},
                "plant": {"num_turbines": "int"},
                "port": {"monthly_rate": "USD/month (optional, default: 0)"},
                "scour_protection": {"tonnes_per_substructure": "t"}
            }),
        }
    }

    /// Keys a design phase adds to the project configuration.
    pub fn output_config(self) -> Value {
        match self {
            PhaseKind::ProjectDevelopment => json!({
                "project_development": {"total_cost": "USD"}
            }),
            PhaseKind::MonopileDesign => json!({
                "monopile": {
                    "diameter": "m",
                    "thickness": "m",
                    "length": "m",
                    "weight": "t",
                    "deck_space": "m^2"
                },
                "transition_piece": {"diameter": "m", "length": "m", "weight": "t", "deck_space": "m^2"}
            }),
            PhaseKind::ArraySystemDesign | PhaseKind::CustomArraySystemDesign => json!({
                "array_system": {
                    "num_strings": "int",
                    "turbines_per_string": "list of int",
                    "string_lengths": "list of km",
                    "total_length": "km"
                }
            }),
            PhaseKind::ExportSystemDesign => json!({
                "export_system": {"num_cables": "int", "cable_length": "km", "total_length": "km"}
            }),
            PhaseKind::ScourProtectionDesign => json!({
                "scour_protection": {"tonnes_per_substructure": "t"}
            }),
            PhaseKind::OffshoreSubstationDesign => json!({
                "offshore_substation": {
                    "num_substations": "int",
                    "topside_mass": "t",
                    "substructure_mass": "t"
                }
            }),
            _ => json!({}),
        }
    }

    /// Run one phase on its merged configuration.
    pub fn run(
        self,
        name: &str,
        config: &Map<String, Value>,
        weather: Option<&WeatherProfile>,
    ) -> BosResult<PhaseOutcome> {
        match self.category() {
            PhaseCategory::Design => design::run(self, name, config),
            PhaseCategory::Install => install::run(self, name, config, weather),
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PhaseKind {
    type Err = BosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseKind::resolve(s)
    }
}

/// Result of one phase run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhaseOutcome {
    /// USD
    pub cost: f64,
    /// Hours
    pub time: f64,
    pub logs: PhaseLog,
    /// Merged into the project configuration (design phases)
    pub design_result: Map<String, Value>,
    pub detailed_output: Map<String, Value>,
}
