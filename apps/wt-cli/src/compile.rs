//! Rotor file to solver inputs.

use crate::error::CliResult;
use uom::si::mass_density::kilogram_per_cubic_meter;
use wt_aero::{CpSurface, ParametricRotor};
use wt_core::units::{Density, m};
use wt_project::{DistributionKindDef, RotorFile};
use wt_rotor::{
    ControlLimits, DrivetrainModel, EfficiencyTable, PowerCurveOptions, TableGrid,
    WindDistribution, power_law_shear,
};

/// Everything needed to solve one rotor file.
pub struct RotorModel {
    pub name: String,
    pub rotor: ParametricRotor,
    pub drivetrain: DrivetrainModel,
    pub limits: ControlLimits,
    pub options: PowerCurveOptions,
    pub grid: TableGrid,
    /// Wind speed distribution at hub height
    pub distribution: WindDistribution,
    pub loss_factor: f64,
}

fn surface(file: &RotorFile) -> CpSurface {
    let mut s = CpSurface::default();
    if let Some(def) = &file.surface {
        s.cp_max = def.cp_max.unwrap_or(s.cp_max);
        s.tsr_opt = def.tsr_opt.unwrap_or(s.tsr_opt);
        s.tsr_width = def.tsr_width.unwrap_or(s.tsr_width);
        s.pitch_per_tsr = def.pitch_per_tsr.unwrap_or(s.pitch_per_tsr);
        s.pitch_width = def.pitch_width_deg.unwrap_or(s.pitch_width);
    }
    s
}

fn drivetrain(file: &RotorFile) -> CliResult<DrivetrainModel> {
    let def = &file.drivetrain;
    Ok(match &def.table {
        Some(table) => {
            let kind = table.table_type.parse()?;
            DrivetrainModel::Table(EfficiencyTable::from_rows(&table.rows, kind)?)
        }
        None => DrivetrainModel::Polynomial(def.kind.parse()?),
    })
}

/// Scales the configured mean wind speed from its reference height to hub
/// height with the power-law profile.
fn distribution(file: &RotorFile) -> CliResult<WindDistribution> {
    let aep = &file.aep;
    let hub = file.rotor.hub_height_m;
    let z_ref = aep.reference_height_m.unwrap_or(hub);
    let mean = power_law_shear(aep.mean_wind_speed_mps, z_ref, hub, aep.shear_exponent)?;
    let dist = match aep.distribution {
        DistributionKindDef::Weibull => WindDistribution::Weibull {
            mean,
            k: aep.weibull_k,
        },
        DistributionKindDef::Rayleigh => WindDistribution::Rayleigh { mean },
    };
    dist.validate()?;
    Ok(dist)
}

pub fn compile_rotor(file: &RotorFile) -> CliResult<RotorModel> {
    let r = &file.rotor;
    let rotor = ParametricRotor::new(
        m(r.tip_radius_m),
        m(r.hub_radius_m),
        r.n_blades,
        Density::new::<kilogram_per_cubic_meter>(r.air_density_kg_m3),
        surface(file),
    )?;

    let c = &file.control;
    let limits = ControlLimits::from_raw(
        c.v_in_mps,
        c.v_out_mps,
        c.rated_power_w,
        c.min_rotor_speed_rpm,
        c.max_rotor_speed_rpm,
        c.max_tip_speed_mps,
        c.region2_tsr,
        c.region2_pitch_deg,
    );
    limits.validate()?;

    let pc = &file.power_curve;
    let options = PowerCurveOptions {
        n_points: pc.n_points,
        n_spline: pc.n_spline,
        regulate_region25: pc.regulate_region25,
        regulate_region3: pc.regulate_region3,
    };

    let t = &file.tables;
    let grid = TableGrid {
        tsr: t.tsr.clone(),
        pitch: t.pitch_deg.clone(),
        wind_speed: t.wind_speed_mps.clone(),
        n_tsr: t.n_tsr,
        n_pitch: t.n_pitch,
        n_wind: t.n_wind,
    };

    Ok(RotorModel {
        name: file.name.clone(),
        rotor,
        drivetrain: drivetrain(file)?,
        limits,
        options,
        grid,
        distribution: distribution(file)?,
        loss_factor: file.aep.loss_factor,
    })
}
