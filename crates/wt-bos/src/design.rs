//! Parametric design phases.
//!
//! Each model sizes one system from the project configuration and returns
//! its `design_result`, which later phases read as ordinary configuration.

use crate::error::BosResult;
use crate::params::Params;
use crate::phase::{PhaseKind, PhaseOutcome};
use serde_json::{Map, Value, json};
use std::f64::consts::PI;
use tracing::debug;

/// Structural steel density (t/m³)
const STEEL_DENSITY: f64 = 7.86;
/// Allowable bending stress for monopile steel (Pa)
const ALLOWABLE_STRESS: f64 = 166.0e6;
const AIR_DENSITY: f64 = 1.225;
/// Thrust coefficient at rated wind speed
const RATED_THRUST_COEFFICIENT: f64 = 0.8;

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

pub(crate) fn run(kind: PhaseKind, name: &str, config: &Map<String, Value>) -> BosResult<PhaseOutcome> {
    let p = Params::new(name, config);
    let outcome = match kind {
        PhaseKind::ProjectDevelopment => project_development(&p)?,
        PhaseKind::MonopileDesign => monopile(&p)?,
        PhaseKind::ArraySystemDesign => array_system(&p)?,
        PhaseKind::CustomArraySystemDesign => custom_array_system(&p)?,
        PhaseKind::ExportSystemDesign => export_system(&p)?,
        PhaseKind::ScourProtectionDesign => scour_protection(&p)?,
        PhaseKind::OffshoreSubstationDesign => offshore_substation(&p)?,
        _ => return Err(p.invalid(&[], format!("{kind} is not a design phase"))),
    };
    debug!(phase = name, cost = outcome.cost, time = outcome.time, "design phase complete");
    Ok(outcome)
}

fn project_development(p: &Params<'_>) -> BosResult<PhaseOutcome> {
    const ITEMS: [(&str, f64, f64); 5] = [
        ("site_auction", 100e6, 0.0),
        ("site_assessment_plan", 0.5e6, 8760.0),
        ("site_assessment", 50e6, 43800.0),
        ("construction_operations_plan", 1e6, 43800.0),
        ("design_install_plan", 0.25e6, 8760.0),
    ];
    let mut cost = 0.0;
    let mut time = 0.0;
    let mut detail = Map::new();
    for (item, default_cost, default_duration) in ITEMS {
        let c = p.f64_or(&["project_development", &format!("{item}_cost")], default_cost)?;
        let d = p.f64_or(&["project_development", &format!("{item}_duration")], default_duration)?;
        cost += c;
        time += d;
        detail.insert(format!("{item}_cost"), json!(c));
    }
    Ok(PhaseOutcome {
        cost,
        time,
        design_result: object(json!({"project_development": {"total_cost": cost}})),
        detailed_output: object(json!({"project_development": detail})),
        ..Default::default()
    })
}

fn monopile(p: &Params<'_>) -> BosResult<PhaseOutcome> {
    let depth = p.positive(&["site", "depth"])?;
    let n = p.count(&["plant", "num_turbines"])?;
    let rotor_diameter = p.positive(&["turbine", "rotor_diameter"])?;
    let hub_height = p.positive(&["turbine", "hub_height"])?;
    let rated_ws = p.positive(&["turbine", "rated_windspeed"])?;
    let steel_cost = p.f64_or(&["monopile_design", "steel_cost"], 3000.0)?;
    let tp_steel_cost = p.f64_or(&["monopile_design", "tp_steel_cost"], 3000.0)?;
    let air_gap = p.f64_or(&["monopile_design", "air_gap"], 10.0)?;

    let diameter = 3.0 + 0.035 * rotor_diameter + 0.04 * depth;

    // Bending at the mudline from rated thrust
    let area = PI * (rotor_diameter / 2.0).powi(2);
    let thrust = 0.5 * AIR_DENSITY * area * RATED_THRUST_COEFFICIENT * rated_ws.powi(2);
    let moment = thrust * (hub_height + depth);
    let t_bending = 4.0 * moment / (PI * diameter.powi(2) * ALLOWABLE_STRESS);
    let thickness = (0.00635 + diameter / 100.0).max(t_bending);

    let embedment = 4.0 * diameter;
    let length = embedment + depth + air_gap;
    let weight = PI * diameter * thickness * length * STEEL_DENSITY;

    let tp_diameter = diameter + 0.5;
    let tp_length = air_gap + 15.0;
    let tp_weight = PI * tp_diameter * thickness * tp_length * STEEL_DENSITY;

    let unit_cost = weight * steel_cost + tp_weight * tp_steel_cost;
    let cost = unit_cost * n as f64;

    Ok(PhaseOutcome {
        cost,
        time: 0.0,
        design_result: object(json!({
            "monopile": {
                "diameter": diameter,
                "thickness": thickness,
                "length": length,
                "weight": weight,
                "deck_space": diameter * length
            },
            "transition_piece": {
                "diameter": tp_diameter,
                "length": tp_length,
                "weight": tp_weight,
                "deck_space": tp_diameter.powi(2)
            }
        })),
        detailed_output: object(json!({"monopile_unit_cost": unit_cost})),
        ..Default::default()
    })
}

fn array_result(counts: &[usize], lengths: &[f64], cable_cost: f64) -> PhaseOutcome {
    let total: f64 = lengths.iter().sum();
    let cost = total * cable_cost;
    PhaseOutcome {
        cost,
        time: 0.0,
        design_result: object(json!({
            "array_system": {
                "num_strings": counts.len(),
                "turbines_per_string": counts,
                "string_lengths": lengths,
                "total_length": total
            }
        })),
        detailed_output: object(json!({"array_system_total_cable_length": total})),
        ..Default::default()
    }
}

fn array_system(p: &Params<'_>) -> BosResult<PhaseOutcome> {
    let n = p.count(&["plant", "num_turbines"])?;
    let spacing = p.positive(&["plant", "turbine_spacing"])?;
    let row_spacing = p.f64_or(&["plant", "row_spacing"], spacing)?;
    let rotor_diameter = p.positive(&["turbine", "rotor_diameter"])?;
    let rating = p.positive(&["turbine", "turbine_rating"])?;
    let cable_capacity = p.f64_or(&["array_system_design", "cable_capacity"], 40.0)?;
    let cable_cost = p.f64_or(&["array_system_design", "cable_cost"], 400_000.0)?;
    if n == 0 {
        return Err(p.invalid(&["plant", "num_turbines"], "must be at least 1"));
    }

    let per_string = ((cable_capacity / rating).floor() as usize).max(1);
    let counts: Vec<usize> = (0..n)
        .step_by(per_string)
        .map(|start| per_string.min(n - start))
        .collect();
    let lengths: Vec<f64> = counts
        .iter()
        .map(|&c| (c as f64 * spacing + row_spacing) * rotor_diameter / 1000.0)
        .collect();
    Ok(array_result(&counts, &lengths, cable_cost))
}

fn custom_array_system(p: &Params<'_>) -> BosResult<PhaseOutcome> {
    let n = p.count(&["plant", "num_turbines"])?;
    let counts_raw = p.f64_list(&["array_system_design", "turbines_per_string"])?;
    let lengths = p.f64_list(&["array_system_design", "string_lengths"])?;
    let cable_cost = p.f64_or(&["array_system_design", "cable_cost"], 400_000.0)?;

    if counts_raw.len() != lengths.len() {
        return Err(p.invalid(
            &["array_system_design", "string_lengths"],
            "needs one length per string",
        ));
    }
    if counts_raw.iter().any(|c| *c < 1.0 || c.fract() != 0.0) || lengths.iter().any(|l| *l <= 0.0) {
        return Err(p.invalid(
            &["array_system_design"],
            "string counts must be positive integers and lengths positive",
        ));
    }
    let counts: Vec<usize> = counts_raw.iter().map(|c| *c as usize).collect();
    if counts.iter().sum::<usize>() != n {
        return Err(p.invalid(
            &["array_system_design", "turbines_per_string"],
            format!("strings hold {} turbines, plant has {n}", counts.iter().sum::<usize>()),
        ));
    }
    Ok(array_result(&counts, &lengths, cable_cost))
}

fn export_system(p: &Params<'_>) -> BosResult<PhaseOutcome> {
    let capacity = p.positive(&["plant", "capacity"])?;
    let distance = p.positive(&["site", "distance_to_landfall"])?;
    let cable_capacity = p.f64_or(&["export_system_design", "cable_capacity"], 250.0)?;
    let cable_cost = p.f64_or(&["export_system_design", "cable_cost"], 800_000.0)?;
    let added = p.f64_or(&["export_system_design", "percent_added_length"], 0.0)?;

    let num_cables = (capacity / cable_capacity).ceil().max(1.0) as usize;
    let cable_length = distance * (1.0 + added);
    let total = cable_length * num_cables as f64;
    Ok(PhaseOutcome {
        cost: total * cable_cost,
        time: 0.0,
        design_result: object(json!({
            "export_system": {
                "num_cables": num_cables,
                "cable_length": cable_length,
                "total_length": total
            }
        })),
        detailed_output: object(json!({"export_system_total_cable_length": total})),
        ..Default::default()
    })
}

fn scour_protection(p: &Params<'_>) -> BosResult<PhaseOutcome> {
    let n = p.count(&["plant", "num_turbines"])?;
    let diameter = p.positive(&["monopile", "diameter"])?;
    let cost_per_tonne = p.f64_or(&["scour_protection_design", "cost_per_tonne"], 40.0)?;
    let rock_density = p.f64_or(&["scour_protection_design", "rock_density"], 2600.0)?;
    let design_time = p.f64_or(&["scour_protection_design", "design_time"], 0.0)?;
    let phi = p.f64_or(&["scour_protection_design", "soil_friction_angle"], 33.5)?;
    let equilibrium = p.f64_or(&["scour_protection_design", "scour_depth_equilibrium"], 1.3)?;
    let protection_depth = p.f64_or(&["scour_protection_design", "scour_protection_depth"], 1.0)?;

    let radius = diameter / 2.0 + equilibrium * diameter / phi.to_radians().tan();
    let volume = PI * radius.powi(2) * protection_depth;
    let tonnes = volume * rock_density / 1000.0;
    Ok(PhaseOutcome {
        cost: tonnes * n as f64 * cost_per_tonne,
        time: design_time,
        design_result: object(json!({
            "scour_protection": {"tonnes_per_substructure": tonnes}
        })),
        detailed_output: object(json!({"scour_protection_radius": radius})),
        ..Default::default()
    })
}

fn offshore_substation(p: &Params<'_>) -> BosResult<PhaseOutcome> {
    let capacity = p.positive(&["plant", "capacity"])?;
    let depth = p.positive(&["site", "depth"])?;
    let sub_capacity = p.f64_or(&["substation_design", "substation_capacity"], 800.0)?;
    let topside_rate = p.f64_or(&["substation_design", "topside_cost_rate"], 7250.0)?;
    let steel_cost = p.f64_or(&["substation_design", "substructure_steel_cost"], 3000.0)?;

    let n = (capacity / sub_capacity).ceil().max(1.0);
    let per = capacity / n;
    let topside_mass = 3.85 * per + 285.0;
    let substructure_mass = 0.4 * topside_mass + 10.0 * depth;
    let cost = n * (topside_mass * topside_rate + substructure_mass * steel_cost);
    Ok(PhaseOutcome {
        cost,
        time: 0.0,
        design_result: object(json!({
            "offshore_substation": {
                "num_substations": n as usize,
                "topside_mass": topside_mass,
                "substructure_mass": substructure_mass
            }
        })),
        detailed_output: object(json!({"substation_capacity_each": per})),
        ..Default::default()
    })
}
