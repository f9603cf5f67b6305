//! Cp/Ct/Cq tables over a (tip-speed ratio, pitch, wind speed) grid.

use crate::error::{RotorError, RotorResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use wt_aero::AeroOracle;
use wt_core::interp::linspace;
use wt_core::units::rad_s_to_rpm;

/// Grid requested for [`generate`]. Unset vectors (empty or all zero) are
/// replaced by the default linear grids.
#[derive(Clone, Debug, PartialEq)]
pub struct TableGrid {
    pub tsr: Vec<f64>,
    pub pitch: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub n_tsr: usize,
    pub n_pitch: usize,
    pub n_wind: usize,
}

impl Default for TableGrid {
    fn default() -> Self {
        Self {
            tsr: Vec::new(),
            pitch: Vec::new(),
            wind_speed: Vec::new(),
            n_tsr: 20,
            n_pitch: 20,
            n_wind: 1,
        }
    }
}

/// Coefficient tables indexed `[tsr][pitch][wind_speed]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTables {
    pub tsr: Vec<f64>,
    pub pitch: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub cp: Vec<Vec<Vec<f64>>>,
    pub ct: Vec<Vec<Vec<f64>>>,
    pub cq: Vec<Vec<Vec<f64>>>,
}

fn is_unset(v: &[f64]) -> bool {
    v.iter().all(|&x| x == 0.0)
}

fn or_default(v: &[f64], start: f64, end: f64, n: usize) -> Vec<f64> {
    if is_unset(v) {
        linspace(start, end, n)
    } else {
        v.to_vec()
    }
}

/// Evaluate the oracle at every grid cell.
///
/// Rotor speed for cell `(tsr, U)` is `tsr·U/R`. Rows of constant tip-speed
/// ratio are evaluated in parallel.
pub fn generate<O: AeroOracle + ?Sized>(
    oracle: &O,
    grid: &TableGrid,
    v_in: f64,
    v_out: f64,
) -> RotorResult<CoefficientTables> {
    let tsr = or_default(&grid.tsr, 7.0, 11.0, grid.n_tsr);
    let pitch = or_default(&grid.pitch, -5.0, 5.0, grid.n_pitch);
    let wind_speed = or_default(&grid.wind_speed, v_in, v_out, grid.n_wind);
    if tsr.is_empty() || pitch.is_empty() || wind_speed.is_empty() {
        return Err(RotorError::InvalidArg {
            what: "coefficient table grid is empty",
        });
    }

    let radius = oracle.rotor_radius();
    let rows: Vec<Row> = tsr
        .par_iter()
        .map(|&t| row(oracle, t, &pitch, &wind_speed, radius))
        .collect::<RotorResult<_>>()?;

    let mut tables = CoefficientTables {
        tsr,
        pitch,
        wind_speed,
        cp: Vec::with_capacity(rows.len()),
        ct: Vec::with_capacity(rows.len()),
        cq: Vec::with_capacity(rows.len()),
    };
    for r in rows {
        tables.cp.push(r.cp);
        tables.ct.push(r.ct);
        tables.cq.push(r.cq);
    }
    Ok(tables)
}

struct Row {
    cp: Vec<Vec<f64>>,
    ct: Vec<Vec<f64>>,
    cq: Vec<Vec<f64>>,
}

fn row<O: AeroOracle + ?Sized>(
    oracle: &O,
    tsr: f64,
    pitch: &[f64],
    wind_speed: &[f64],
    radius: f64,
) -> RotorResult<Row> {
    let (np, nu) = (pitch.len(), wind_speed.len());
    let mut out = Row {
        cp: vec![vec![0.0; nu]; np],
        ct: vec![vec![0.0; nu]; np],
        cq: vec![vec![0.0; nu]; np],
    };

    for (k, &u) in wind_speed.iter().enumerate() {
        let rpm = vec![rad_s_to_rpm(tsr * u / radius); np];
        let us = vec![u; np];
        let samples = oracle.evaluate(&us, &rpm, pitch, true)?;
        for (j, s) in samples.iter().enumerate().take(np) {
            let c = s.coefficients.unwrap_or_default();
            out.cp[j][k] = c.cp;
            out.ct[j][k] = c.ct;
            out.cq[j][k] = c.cq;
        }
    }
    Ok(out)
}
