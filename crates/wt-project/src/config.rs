//! Free-form project configuration.
//!
//! Project files are nested mappings whose shape depends on the phases being
//! run, so they stay as ordered JSON objects rather than a fixed schema.

use crate::economics::EconomicParams;
use crate::phases::InstallPhases;
use crate::validate::ValidationError;
use crate::ProjectResult;
use serde_json::{Map, Value};

pub type Dict = Map<String, Value>;

/// Merge `right` into a copy of `left`.
///
/// Nested mappings present on both sides are merged recursively. Other keys
/// already in `left` are replaced only when `overwrite` is set. With
/// `add_keys` false, keys of `right` missing from `left` are ignored.
pub fn merge_dicts(left: &Dict, right: &Dict, overwrite: bool, add_keys: bool) -> Dict {
    let mut new = left.clone();
    for (k, rv) in right {
        let merged = match (new.get(k), rv) {
            (None, _) if !add_keys => continue,
            (Some(Value::Object(lv)), Value::Object(rv)) => {
                Value::Object(merge_dicts(lv, rv, overwrite, add_keys))
            }
            (Some(_), _) if !overwrite => continue,
            _ => rv.clone(),
        };
        new.insert(k.clone(), merged);
    }
    new
}

/// Copy of `left` with the keys of `right` removed, recursing into mappings
/// present on both sides. Mappings emptied by the removal are dropped.
pub fn remove_keys(left: &Dict, right: &Dict) -> Dict {
    let mut new = left.clone();
    for (k, rv) in right {
        let pruned = match (new.get(k), rv) {
            (None, _) => continue,
            (Some(Value::Object(lm)), Value::Object(rm)) => remove_keys(lm, rm),
            _ => Dict::new(),
        };
        if pruned.is_empty() {
            new.remove(k);
        } else {
            new.insert(k.clone(), Value::Object(pruned));
        }
    }
    new
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectConfig {
    map: Dict,
}

impl ProjectConfig {
    pub fn new(map: Dict) -> Self {
        Self { map }
    }

    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self { map }),
            other => Err(ValidationError::InvalidValue {
                field: "project".to_string(),
                value: other.to_string(),
                reason: "top level must be a mapping".to_string(),
            }),
        }
    }

    pub fn from_yaml_str(s: &str) -> ProjectResult<Self> {
        let value: Value = serde_yaml::from_str(s)?;
        Ok(Self::from_value(value)?)
    }

    pub fn from_json_str(s: &str) -> ProjectResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Self::from_value(value)?)
    }

    pub fn as_map(&self) -> &Dict {
        &self.map
    }

    pub fn into_map(self) -> Dict {
        self.map
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.map.insert(key.into(), value)
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.map.get(*first)?, |v, k| v.as_object()?.get(*k))
    }

    pub fn get_f64(&self, path: &[&str]) -> Option<f64> {
        self.get_path(path).and_then(Value::as_f64)
    }

    /// Set a nested value, creating intermediate mappings as needed.
    pub fn set_path(&mut self, path: &[&str], value: Value) -> Result<(), ValidationError> {
        let Some((last, parents)) = path.split_last() else {
            return Ok(());
        };
        let mut cur = &mut self.map;
        for key in parents {
            let entry = cur
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Dict::new()));
            cur = entry
                .as_object_mut()
                .ok_or_else(|| ValidationError::InvalidValue {
                    field: path.join("."),
                    value: key.to_string(),
                    reason: "parent is not a mapping".to_string(),
                })?;
        }
        cur.insert(last.to_string(), value);
        Ok(())
    }

    /// Merge `other` in; see [`merge_dicts`].
    pub fn merge(&mut self, other: &Dict, overwrite: bool) {
        self.map = merge_dicts(&self.map, other, overwrite, true);
    }

    /// Project capacity in MW.
    pub fn capacity(&self) -> Option<f64> {
        self.get_f64(&["plant", "capacity"])
    }

    pub fn num_turbines(&self) -> Option<f64> {
        self.get_f64(&["plant", "num_turbines"])
    }

    /// Turbine rating in MW.
    pub fn turbine_rating(&self) -> Option<f64> {
        self.get_f64(&["turbine", "turbine_rating"])
    }

    /// `design_phases`, accepting a single name as a one-element list.
    pub fn design_phases(&self) -> Result<Vec<String>, ValidationError> {
        match self.map.get("design_phases") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ValidationError::InvalidValue {
                            field: "design_phases".to_string(),
                            value: v.to_string(),
                            reason: "phase names must be strings".to_string(),
                        })
                })
                .collect(),
            Some(other) => Err(ValidationError::InvalidValue {
                field: "design_phases".to_string(),
                value: other.to_string(),
                reason: "expected a list of phase names".to_string(),
            }),
        }
    }

    pub fn install_phases(&self) -> Result<InstallPhases, ValidationError> {
        InstallPhases::from_value(self.map.get("install_phases"))
    }

    pub fn economics(&self) -> Result<EconomicParams, ValidationError> {
        EconomicParams::from_config(self)
    }

    /// Configuration seen by one phase: every general key (those for which
    /// `is_phase_key` is false) with the phase's own section merged on top.
    pub fn phase_config(&self, phase: &str, is_phase_key: impl Fn(&str) -> bool) -> Dict {
        let general: Dict = self
            .map
            .iter()
            .filter(|(k, _)| !is_phase_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        match self.map.get(phase) {
            Some(Value::Object(specific)) => merge_dicts(&general, specific, true, true),
            _ => general,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(v: Value) -> Dict {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn merge_recurses_and_respects_overwrite() {
        let left = dict(json!({"site": {"depth": 20, "distance": 50}, "plant": {"num_turbines": 10}}));
        let right = dict(json!({"site": {"depth": 30, "mean_windspeed": 9}, "turbine": {"rating": 6}}));

        let m = merge_dicts(&left, &right, true, true);
        assert_eq!(m["site"]["depth"], json!(30));
        assert_eq!(m["site"]["distance"], json!(50));
        assert_eq!(m["site"]["mean_windspeed"], json!(9));
        assert_eq!(m["turbine"]["rating"], json!(6));

        let m = merge_dicts(&left, &right, false, true);
        assert_eq!(m["site"]["depth"], json!(20));
        assert_eq!(m["site"]["mean_windspeed"], json!(9));

        let m = merge_dicts(&left, &right, true, false);
        assert!(!m.contains_key("turbine"));
        assert_eq!(m["site"]["depth"], json!(30));
    }

    #[test]
    fn remove_keys_prunes_empty_sections() {
        let left = dict(json!({"site": {"depth": 20}, "monopile": {"diameter": 10, "length": 80}, "x": 1}));
        let right = dict(json!({"site": {"depth": ""}, "monopile": {"diameter": ""}, "missing": 1}));
        let r = remove_keys(&left, &right);
        assert!(!r.contains_key("site"));
        assert_eq!(r["monopile"], json!({"length": 80}));
        assert_eq!(r["x"], json!(1));
    }

    #[test]
    fn phase_config_prefers_specific_section() {
        let cfg = ProjectConfig::from_value(json!({
            "site": {"distance": 50, "depth": 20},
            "TurbineInstallation": {"site": {"distance": 100}},
            "install_phases": ["TurbineInstallation"]
        }))
        .unwrap();
        let pc = cfg.phase_config("TurbineInstallation", |k| k == "TurbineInstallation");
        assert_eq!(pc["site"]["distance"], json!(100));
        assert_eq!(pc["site"]["depth"], json!(20));
        assert!(!pc.contains_key("TurbineInstallation"));
    }

    #[test]
    fn path_access() {
        let mut cfg = ProjectConfig::default();
        cfg.set_path(&["plant", "capacity"], json!(100.0)).unwrap();
        assert_eq!(cfg.capacity(), Some(100.0));
        assert_eq!(cfg.num_turbines(), None);
        cfg.insert("x", json!(1));
        assert!(cfg.set_path(&["x", "y"], json!(2)).is_err());
    }

    #[test]
    fn design_phases_accepts_single_name() {
        let cfg = ProjectConfig::from_value(json!({"design_phases": "MonopileDesign"})).unwrap();
        assert_eq!(cfg.design_phases().unwrap(), vec!["MonopileDesign"]);
        let cfg = ProjectConfig::from_value(json!({"design_phases": [1]})).unwrap();
        assert!(cfg.design_phases().is_err());
    }
}
