//! Installation vessels.

use crate::error::BosResult;
use crate::params::Params;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct Vessel {
    pub name: String,
    /// USD per day
    pub day_rate: f64,
    /// km/h
    pub transit_speed: f64,
    /// Operational wind speed limit (m/s)
    pub max_windspeed: f64,
    /// Cargo capacity (t)
    pub max_cargo: f64,
    /// Deck space (m²)
    pub deck_space: f64,
}

impl Vessel {
    /// Built-in vessel specifications.
    pub fn library(name: &str) -> Option<Vessel> {
        let v = |name: &str, day_rate, transit_speed, max_windspeed, max_cargo, deck_space| Vessel {
            name: name.to_string(),
            day_rate,
            transit_speed,
            max_windspeed,
            max_cargo,
            deck_space,
        };
        Some(match name {
            "example_wtiv" => v("Example WTIV", 180_000.0, 20.0, 15.0, 8_000.0, 4_000.0),
            "example_heavy_lift_vessel" => {
                v("Example Heavy Lift Vessel", 500_000.0, 14.0, 15.0, 12_000.0, 4_000.0)
            }
            "example_cable_lay_vessel" => {
                v("Example Cable Lay Vessel", 120_000.0, 20.0, 25.0, 4_000.0, 1_000.0)
            }
            "example_scour_protection_vessel" => {
                v("Example Scour Protection Vessel", 50_000.0, 20.0, 20.0, 10_000.0, 1_000.0)
            }
            _ => return None,
        })
    }

    /// Vessel at `key`: a library name, or a mapping whose entries override
    /// the library vessel `default`.
    pub(crate) fn from_config(p: &Params<'_>, key: &str, default: &str) -> BosResult<Vessel> {
        let base = |name: &str| {
            Vessel::library(name).ok_or_else(|| p.invalid(&[key], format!("unknown vessel '{name}'")))
        };
        match p.get(&[key]) {
            None | Some(Value::Null) => base(default),
            Some(Value::String(name)) => base(name.as_str()),
            Some(Value::Object(spec)) => {
                let mut v = base(default)?;
                if let Some(name) = spec.get("name").and_then(Value::as_str) {
                    v.name = name.to_string();
                }
                v.day_rate = p.f64_or(&[key, "day_rate"], v.day_rate)?;
                v.transit_speed = p.f64_or(&[key, "transit_speed"], v.transit_speed)?;
                v.max_windspeed = p.f64_or(&[key, "max_windspeed"], v.max_windspeed)?;
                v.max_cargo = p.f64_or(&[key, "max_cargo"], v.max_cargo)?;
                v.deck_space = p.f64_or(&[key, "deck_space"], v.deck_space)?;
                if !(v.day_rate >= 0.0 && v.transit_speed > 0.0 && v.max_cargo > 0.0 && v.deck_space > 0.0) {
                    return Err(p.invalid(&[key], "rates, speed and capacities must be positive"));
                }
                Ok(v)
            }
            Some(other) => Err(p.invalid(&[key], format!("expected a vessel name or mapping, got {other}"))),
        }
    }

    pub fn hourly_rate(&self) -> f64 {
        self.day_rate / 24.0
    }
}
