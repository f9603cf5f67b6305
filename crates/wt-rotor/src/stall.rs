//! Stall margin along the blade span.

use crate::error::{RotorError, RotorResult};
use tracing::warn;

/// Ratio `(aoa + margin) / stall_angle` at every station from the one
/// closest to `min_s` out to the tip; inboard stations are zero.
///
/// `s` is the nondimensional span coordinate of each station. A zero stall
/// angle is replaced by 1e-6. Values above one mean the section stalls.
pub fn no_stall_constraint(
    aoa: &[f64],
    stall_angles: &[f64],
    margin: f64,
    s: &[f64],
    min_s: f64,
) -> RotorResult<Vec<f64>> {
    if aoa.len() != stall_angles.len() || aoa.len() != s.len() {
        return Err(RotorError::InvalidArg {
            what: "stall constraint inputs differ in length",
        });
    }

    let i_min = s
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - min_s).abs().total_cmp(&(b.1 - min_s).abs()))
        .map_or(0, |(i, _)| i);

    let mut out = vec![0.0; s.len()];
    for i in i_min..s.len() {
        let stall = if stall_angles[i] == 0.0 {
            1e-6
        } else {
            stall_angles[i]
        };
        out[i] = (aoa[i] + margin) / stall;
        if out[i] > 1.0 {
            warn!(span = s[i], ratio = out[i], "blade stalls");
        }
    }
    Ok(out)
}
