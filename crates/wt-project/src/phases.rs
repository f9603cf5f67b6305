//! `install_phases`: a serial list or a start-time mapping.

use crate::validate::ValidationError;
use chrono::NaiveDate;
use serde_json::Value;

/// Calendar start dates in `install_phases`.
pub const DATE_FORMAT: &str = "%m/%d/%Y";
/// Start/end timestamps reported for date-started phases.
pub const DATE_FORMAT_LONG: &str = "%m/%d/%Y %H:%M";

#[derive(Debug, Clone, PartialEq)]
pub enum PhaseStart {
    /// Hours from the start of the weather profile, rounded up
    Offset(f64),
    /// Calendar date located in the weather profile
    Date(NaiveDate),
    /// Start once `target` is `fraction` complete
    After { target: String, fraction: f64 },
}

impl PhaseStart {
    pub fn is_defined(&self) -> bool {
        !matches!(self, PhaseStart::After { .. })
    }

    fn parse(name: &str, v: &Value) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidValue {
            field: format!("install_phases.{name}"),
            value: v.to_string(),
            reason: "expected a number, a date (MM/DD/YYYY) or [phase, fraction]".to_string(),
        };
        match v {
            Value::Number(n) => n
                .as_f64()
                .filter(|x| x.is_finite())
                .map(|x| PhaseStart::Offset(x.ceil()))
                .ok_or_else(invalid),
            Value::String(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(PhaseStart::Date)
                .map_err(|_| invalid()),
            Value::Array(items) => match items.as_slice() {
                [Value::String(target), Value::Number(f)] => {
                    let fraction = f.as_f64().filter(|x| x.is_finite()).ok_or_else(invalid)?;
                    Ok(PhaseStart::After {
                        target: target.clone(),
                        fraction,
                    })
                }
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstallPhases {
    /// Run one after another
    Serial(Vec<String>),
    /// Run at defined starts, then by dependency
    Scheduled(Vec<(String, PhaseStart)>),
}

impl Default for InstallPhases {
    fn default() -> Self {
        InstallPhases::Serial(Vec::new())
    }
}

impl InstallPhases {
    pub fn from_value(value: Option<&Value>) -> Result<Self, ValidationError> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::String(s)) => Ok(InstallPhases::Serial(vec![s.clone()])),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ValidationError::InvalidValue {
                            field: "install_phases".to_string(),
                            value: v.to_string(),
                            reason: "phase names must be strings".to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(InstallPhases::Serial),
            Some(Value::Object(map)) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| PhaseStart::parse(k, v).map(|s| (k.clone(), s)))
                    .collect::<Result<Vec<_>, _>>()?;
                if !entries.iter().any(|(_, s)| s.is_defined()) {
                    return Err(ValidationError::NoDefinedStart);
                }
                Ok(InstallPhases::Scheduled(entries))
            }
            Some(other) => Err(ValidationError::InvalidValue {
                field: "install_phases".to_string(),
                value: other.to_string(),
                reason: "expected a list or a mapping".to_string(),
            }),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            InstallPhases::Serial(names) => names.iter().map(String::as_str).collect(),
            InstallPhases::Scheduled(entries) => entries.iter().map(|(n, _)| n.as_str()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    pub fn start_of(&self, name: &str) -> Option<&PhaseStart> {
        match self {
            InstallPhases::Serial(_) => None,
            InstallPhases::Scheduled(entries) => {
                entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
            }
        }
    }
}
