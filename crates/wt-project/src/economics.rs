//! Economic scalars of a project configuration.

use crate::config::ProjectConfig;
use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicParams {
    /// Fraction of BOS plus turbine CAPEX
    pub commissioning: f64,
    /// Fraction of installation CAPEX
    pub decommissioning: f64,
    /// Net capacity factor
    pub ncf: f64,
    /// $/MWh
    pub offtake_price: f64,
    /// Years
    pub project_lifetime: u32,
    /// Annual
    pub discount_rate: f64,
    /// $/kW/year
    pub opex_rate: f64,
    /// $/kW
    pub turbine_capex: f64,
}

impl Default for EconomicParams {
    fn default() -> Self {
        Self {
            commissioning: 0.0,
            decommissioning: 0.0,
            ncf: 0.4,
            offtake_price: 80.0,
            project_lifetime: 25,
            discount_rate: 0.025,
            opex_rate: 150.0,
            turbine_capex: 0.0,
        }
    }
}

fn number(config: &ProjectConfig, key: &str, default: f64) -> Result<f64, ValidationError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_f64()
            .filter(|x| x.is_finite())
            .ok_or_else(|| ValidationError::InvalidValue {
                field: key.to_string(),
                value: v.to_string(),
                reason: "must be a finite number".to_string(),
            }),
    }
}

impl EconomicParams {
    pub fn from_config(config: &ProjectConfig) -> Result<Self, ValidationError> {
        let d = Self::default();
        let lifetime = number(config, "project_lifetime", d.project_lifetime as f64)?;
        if lifetime < 0.0 || lifetime.fract() != 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "project_lifetime".to_string(),
                value: lifetime.to_string(),
                reason: "must be a whole number of years".to_string(),
            });
        }
        let params = Self {
            commissioning: number(config, "commissioning", d.commissioning)?,
            decommissioning: number(config, "decommissioning", d.decommissioning)?,
            ncf: number(config, "ncf", d.ncf)?,
            offtake_price: number(config, "offtake_price", d.offtake_price)?,
            project_lifetime: lifetime as u32,
            discount_rate: number(config, "discount_rate", d.discount_rate)?,
            opex_rate: number(config, "opex_rate", d.opex_rate)?,
            turbine_capex: number(config, "turbine_capex", d.turbine_capex)?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, v) in [
            ("commissioning", self.commissioning),
            ("decommissioning", self.decommissioning),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    value: v.to_string(),
                    reason: "must be between 0 and 1".to_string(),
                });
            }
        }
        if self.discount_rate <= -1.0 {
            return Err(ValidationError::InvalidValue {
                field: "discount_rate".to_string(),
                value: self.discount_rate.to_string(),
                reason: "must be greater than -1".to_string(),
            });
        }
        Ok(())
    }

    /// Input-template descriptions of each scalar with its default.
    pub fn describe() -> Vec<(&'static str, String)> {
        let d = Self::default();
        vec![
            ("commissioning", format!("float (optional, default: {:?})", d.commissioning)),
            ("decommissioning", format!("float (optional, default: {:?})", d.decommissioning)),
            ("ncf", format!("float (optional, default: {})", d.ncf)),
            ("offtake_price", format!("$/MWh (optional, default: {})", d.offtake_price)),
            ("project_lifetime", format!("yrs (optional, default: {})", d.project_lifetime)),
            ("discount_rate", format!("yearly (optional, default: {})", d.discount_rate)),
            ("opex_rate", format!("$/kW/year (optional, default: {})", d.opex_rate)),
            ("turbine_capex", format!("$/kW (optional, default: {:?})", d.turbine_capex)),
        ]
    }
}
