//! Plant capacity, turbine count and turbine rating.

use crate::config::ProjectConfig;
use crate::validate::ValidationError;
use serde_json::json;
use tracing::debug;
use wt_core::{Tolerances, nearly_equal};

/// Fill in whichever of `plant.capacity`, `plant.num_turbines` and
/// `turbine.turbine_rating` follows from the other two.
///
/// Zero or missing values count as unset. When all three are given they
/// must satisfy `capacity = rating × num_turbines`.
pub fn resolve_project_capacity(mut config: ProjectConfig) -> Result<ProjectConfig, ValidationError> {
    let set = |v: Option<f64>| v.filter(|x| *x != 0.0);
    let capacity = set(config.capacity());
    let rating = set(config.turbine_rating());
    let num = set(config.num_turbines());

    match (capacity, rating, num) {
        (Some(c), Some(r), Some(n)) => {
            if !nearly_equal(c, r * n, Tolerances::default()) {
                return Err(ValidationError::CapacityMismatch {
                    capacity: c,
                    turbine_rating: r,
                    num_turbines: n,
                });
            }
        }
        (Some(c), Some(r), None) => {
            let n = (c / r).ceil();
            debug!(capacity = c, rating = r, num_turbines = n, "resolved turbine count");
            config.set_path(&["plant", "num_turbines"], json!(n as u64))?;
        }
        (Some(c), None, Some(n)) => {
            let r = c / n;
            debug!(capacity = c, num_turbines = n, rating = r, "resolved turbine rating");
            config.set_path(&["turbine", "turbine_rating"], json!(r))?;
        }
        (None, Some(r), Some(n)) => {
            let c = r * n;
            debug!(rating = r, num_turbines = n, capacity = c, "resolved plant capacity");
            config.set_path(&["plant", "capacity"], json!(c))?;
        }
        _ => {}
    }
    Ok(config)
}
