//! Typed lookups into a phase configuration.

use crate::error::{BosError, BosResult};
use serde_json::{Map, Value};

pub(crate) struct Params<'a> {
    phase: &'a str,
    config: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(phase: &'a str, config: &'a Map<String, Value>) -> Self {
        Self { phase, config }
    }

    pub fn phase(&self) -> &'a str {
        self.phase
    }

    pub fn get(&self, path: &[&str]) -> Option<&'a Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.config.get(*first)?, |v, k| v.as_object()?.get(*k))
    }

    fn missing(&self, path: &[&str]) -> BosError {
        BosError::MissingConfig {
            phase: self.phase.to_string(),
            key: path.join("."),
        }
    }

    pub fn invalid(&self, path: &[&str], reason: impl Into<String>) -> BosError {
        BosError::InvalidConfig {
            phase: self.phase.to_string(),
            key: path.join("."),
            reason: reason.into(),
        }
    }

    fn number(&self, path: &[&str], v: &Value) -> BosResult<f64> {
        v.as_f64()
            .filter(|x| x.is_finite())
            .ok_or_else(|| self.invalid(path, format!("expected a number, got {v}")))
    }

    pub fn f64(&self, path: &[&str]) -> BosResult<f64> {
        let v = self.get(path).ok_or_else(|| self.missing(path))?;
        self.number(path, v)
    }

    pub fn f64_or(&self, path: &[&str], default: f64) -> BosResult<f64> {
        match self.get(path) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => self.number(path, v),
        }
    }

    pub fn positive(&self, path: &[&str]) -> BosResult<f64> {
        let v = self.f64(path)?;
        if v > 0.0 {
            Ok(v)
        } else {
            Err(self.invalid(path, "must be positive"))
        }
    }

    pub fn count(&self, path: &[&str]) -> BosResult<usize> {
        let v = self.f64(path)?;
        if v >= 0.0 && v.fract() == 0.0 {
            Ok(v as usize)
        } else {
            Err(self.invalid(path, "must be a whole number"))
        }
    }

    pub fn f64_list(&self, path: &[&str]) -> BosResult<Vec<f64>> {
        match self.get(path) {
            Some(Value::Array(items)) => items.iter().map(|v| self.number(path, v)).collect(),
            Some(other) => Err(self.invalid(path, format!("expected a list, got {other}"))),
            None => Err(self.missing(path)),
        }
    }

    /// Task-time overrides from the phase's `kwargs` section.
    pub fn kwarg(&self, name: &str, default: f64) -> BosResult<f64> {
        self.f64_or(&["kwargs", name], default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookups() {
        let cfg = json!({"site": {"depth": 30, "name": "x"}, "plant": {"num_turbines": 12.5}, "kwargs": {"t": 3}});
        let Value::Object(map) = cfg else { unreachable!() };
        let p = Params::new("P", &map);
        assert_eq!(p.f64(&["site", "depth"]).unwrap(), 30.0);
        assert_eq!(p.f64_or(&["site", "distance"], 50.0).unwrap(), 50.0);
        assert!(p.f64(&["site", "name"]).is_err());
        assert!(matches!(p.f64(&["port"]), Err(BosError::MissingConfig { .. })));
        assert!(p.count(&["plant", "num_turbines"]).is_err());
        assert_eq!(p.kwarg("t", 1.0).unwrap(), 3.0);
        assert_eq!(p.kwarg("u", 1.0).unwrap(), 1.0);
    }
}
