//! Input templates for a set of phases.

use crate::error::{BosError, BosResult};
use crate::phase::{PhaseCategory, PhaseKind};
use serde_json::{Map, Value, json};
use wt_project::{EconomicParams, merge_dicts, remove_keys};

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

/// Configuration template for running `phases`: what the phases read,
/// minus what the design phases among them produce, plus the economic
/// scalars and the phase lists.
pub fn compile_input_dict(phases: &[&str]) -> BosResult<Map<String, Value>> {
    let mut resolved = Vec::with_capacity(phases.len());
    let mut missing = Vec::new();
    for name in phases {
        match PhaseKind::find_key_match(name) {
            Some(kind) => resolved.push((*name, kind)),
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(BosError::PhaseNotFound { names: missing });
    }

    let of = |category: PhaseCategory| {
        resolved
            .iter()
            .filter(move |(_, k)| k.category() == category)
            .copied()
    };

    let mut config = Map::new();
    for (_, kind) in of(PhaseCategory::Install) {
        config = merge_dicts(&config, &object(kind.expected_config()), true, true);
    }
    for (_, kind) in of(PhaseCategory::Design) {
        config = merge_dicts(&config, &object(kind.expected_config()), true, true);
        config = remove_keys(&config, &object(kind.output_config()));
    }

    for (key, description) in EconomicParams::describe() {
        config.insert(key.to_string(), Value::String(description));
    }
    let names = |category| of(category).map(|(n, _)| n).collect::<Vec<_>>();
    config.insert("design_phases".into(), json!(names(PhaseCategory::Design)));
    config.insert("install_phases".into(), json!(names(PhaseCategory::Install)));
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_outputs_are_not_inputs() {
        let c = compile_input_dict(&["MonopileDesign", "MonopileInstallation"]).unwrap();
        // Monopile dimensions come from the design phase
        assert!(c.get("monopile").is_none());
        assert!(c.get("transition_piece").is_none());
        assert!(c["site"].get("depth").is_some());
        assert!(c["turbine"].get("rotor_diameter").is_some());
        assert_eq!(c["design_phases"], json!(["MonopileDesign"]));
        assert_eq!(c["install_phases"], json!(["MonopileInstallation"]));
    }

    #[test]
    fn install_only_needs_dimensions() {
        let c = compile_input_dict(&["MonopileInstallation"]).unwrap();
        assert!(c["monopile"].get("weight").is_some());
        assert_eq!(c["design_phases"], json!([]));
        assert_eq!(c["ncf"], json!("float (optional, default: 0.4)"));
        assert!(c.contains_key("turbine_capex"));
    }

    #[test]
    fn unknown_phases_are_listed() {
        match compile_input_dict(&["Foo", "TurbineInstallation", "Bar_2"]) {
            Err(BosError::PhaseNotFound { names }) => assert_eq!(names, vec!["Foo", "Bar_2"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
