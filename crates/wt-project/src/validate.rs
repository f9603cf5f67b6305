//! Rotor and project validation.

use crate::config::ProjectConfig;
use crate::schema::RotorFile;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error(
        "Input and calculated project capacity don't match: capacity {capacity}, \
         turbine rating {turbine_rating}, {num_turbines} turbines"
    )]
    CapacityMismatch {
        capacity: f64,
        turbine_rating: f64,
        num_turbines: f64,
    },

    #[error("No install phase has a defined start offset or date")]
    NoDefinedStart,
}

pub const DRIVETRAIN_TYPES: [&str; 5] = [
    "GEARED",
    "SINGLE_STAGE",
    "MULTI_DRIVE",
    "PM_DIRECT_DRIVE",
    "CONSTANT_EFF",
];

pub const TABLE_TYPES: [&str; 4] = ["RPM-EFF", "RPM-ELEC", "MECH-EFF", "MECH-ELEC"];

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive and finite"))
    }
}

fn non_negative(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be non-negative and finite"))
    }
}

pub fn validate_rotor(f: &RotorFile) -> Result<(), ValidationError> {
    let r = &f.rotor;
    positive("rotor.tip_radius_m", r.tip_radius_m)?;
    non_negative("rotor.hub_radius_m", r.hub_radius_m)?;
    if r.hub_radius_m >= r.tip_radius_m {
        return Err(invalid(
            "rotor.hub_radius_m",
            r.hub_radius_m,
            "must be smaller than the tip radius",
        ));
    }
    if r.n_blades == 0 {
        return Err(invalid("rotor.n_blades", r.n_blades, "must be at least 1"));
    }
    positive("rotor.air_density_kg_m3", r.air_density_kg_m3)?;
    positive("rotor.hub_height_m", r.hub_height_m)?;

    let c = &f.control;
    positive("control.v_in_mps", c.v_in_mps)?;
    if !(c.v_out_mps > c.v_in_mps) {
        return Err(invalid("control.v_out_mps", c.v_out_mps, "must exceed v_in"));
    }
    positive("control.rated_power_w", c.rated_power_w)?;
    non_negative("control.min_rotor_speed_rpm", c.min_rotor_speed_rpm)?;
    positive("control.max_rotor_speed_rpm", c.max_rotor_speed_rpm)?;
    if c.min_rotor_speed_rpm > c.max_rotor_speed_rpm {
        return Err(invalid(
            "control.min_rotor_speed_rpm",
            c.min_rotor_speed_rpm,
            "must not exceed the maximum rotor speed",
        ));
    }
    positive("control.max_tip_speed_mps", c.max_tip_speed_mps)?;
    positive("control.region2_tsr", c.region2_tsr)?;
    if !c.region2_pitch_deg.is_finite() {
        return Err(invalid("control.region2_pitch_deg", c.region2_pitch_deg, "must be finite"));
    }

    let d = &f.drivetrain;
    if !DRIVETRAIN_TYPES.iter().any(|t| t.eq_ignore_ascii_case(&d.kind)) {
        return Err(invalid("drivetrain.type", &d.kind, "unknown drivetrain type"));
    }
    if let Some(table) = &d.table {
        if !TABLE_TYPES.iter().any(|t| t.eq_ignore_ascii_case(&table.table_type)) {
            return Err(invalid(
                "drivetrain.table.table_type",
                &table.table_type,
                "unknown table type",
            ));
        }
        if table.rows.len() < 2 {
            return Err(invalid(
                "drivetrain.table.rows",
                table.rows.len(),
                "needs at least two rows",
            ));
        }
        if table.rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(invalid("drivetrain.table.rows", "non-finite", "must be finite"));
        }
    }

    let pc = &f.power_curve;
    if pc.n_points < 2 {
        return Err(invalid("power_curve.n_points", pc.n_points, "must be at least 2"));
    }
    if pc.n_spline < 2 {
        return Err(invalid("power_curve.n_spline", pc.n_spline, "must be at least 2"));
    }

    let a = &f.aep;
    non_negative("aep.loss_factor", a.loss_factor)?;
    positive("aep.mean_wind_speed_mps", a.mean_wind_speed_mps)?;
    positive("aep.weibull_k", a.weibull_k)?;
    if !a.shear_exponent.is_finite() {
        return Err(invalid("aep.shear_exponent", a.shear_exponent, "must be finite"));
    }
    if let Some(z) = a.reference_height_m {
        positive("aep.reference_height_m", z)?;
    }

    let t = &f.tables;
    for (field, n) in [("tables.n_tsr", t.n_tsr), ("tables.n_pitch", t.n_pitch), ("tables.n_wind", t.n_wind)] {
        if n == 0 {
            return Err(invalid(field, n, "must be at least 1"));
        }
    }

    if let Some(s) = &f.surface {
        if let Some(cp) = s.cp_max
            && !(cp > 0.0 && cp < 16.0 / 27.0)
        {
            return Err(invalid("surface.cp_max", cp, "must lie below the Betz limit"));
        }
        for (field, v) in [
            ("surface.tsr_opt", s.tsr_opt),
            ("surface.tsr_width", s.tsr_width),
            ("surface.pitch_width_deg", s.pitch_width_deg),
        ] {
            if let Some(v) = v {
                positive(field, v)?;
            }
        }
    }

    Ok(())
}

pub fn validate_project(config: &ProjectConfig) -> Result<(), ValidationError> {
    config.design_phases()?;
    config.install_phases()?;
    config.economics()?;

    for (field, v) in [
        ("plant.capacity", config.capacity()),
        ("plant.num_turbines", config.num_turbines()),
        ("turbine.turbine_rating", config.turbine_rating()),
    ] {
        if let Some(v) = v {
            non_negative(field, v)?;
        }
    }
    if let Some(n) = config.num_turbines()
        && n.fract() != 0.0
    {
        return Err(invalid("plant.num_turbines", n, "must be a whole number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_checks_phase_lists_and_plant() {
        let ok = ProjectConfig::from_value(json!({
            "plant": {"num_turbines": 10},
            "design_phases": ["MonopileDesign"],
            "install_phases": {"MonopileInstallation": 0}
        }))
        .unwrap();
        validate_project(&ok).unwrap();

        let bad = ProjectConfig::from_value(json!({"plant": {"num_turbines": 10.5}})).unwrap();
        assert!(validate_project(&bad).is_err());

        let bad = ProjectConfig::from_value(json!({"plant": {"capacity": -1}})).unwrap();
        assert!(validate_project(&bad).is_err());
    }

    #[test]
    fn messages_name_the_field() {
        let err = invalid("control.v_out_mps", 2.0, "must exceed v_in");
        assert!(err.to_string().contains("control.v_out_mps"));
    }
}
