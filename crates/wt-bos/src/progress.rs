//! When parts of the plant can start generating.

use crate::error::{BosError, BosResult};
use crate::log::ProgressTag;

/// Progress points `(tag, time)` collected from a project log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectProgress {
    points: Vec<(ProgressTag, f64)>,
}

/// Times at which each array string can be energized, with the number of
/// turbines on that string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergizePoints {
    pub times: Vec<f64>,
    pub turbines: Vec<usize>,
}

fn chunk_max(values: &[f64], n: usize) -> Vec<f64> {
    values
        .chunks(n)
        .map(|c| c.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect()
}

impl ProjectProgress {
    pub fn new(points: Vec<(ProgressTag, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(ProgressTag, f64)] {
        &self.points
    }

    /// Times logged for `tag`, in log order.
    pub fn parse_logs(&self, tag: ProgressTag) -> BosResult<Vec<f64>> {
        let times: Vec<f64> = self
            .points
            .iter()
            .filter(|(t, _)| *t == tag)
            .map(|(_, time)| *time)
            .collect();
        if times.is_empty() {
            return Err(BosError::MissingProgress {
                tag: tag.to_string(),
            });
        }
        Ok(times)
    }

    /// Completion of the export system and all offshore substations.
    pub fn complete_export_system(&self) -> BosResult<f64> {
        let export = self.parse_logs(ProgressTag::ExportSystem)?;
        let substations = self.parse_logs(ProgressTag::OffshoreSubstation)?;
        Ok(export
            .into_iter()
            .chain(substations)
            .fold(f64::NEG_INFINITY, f64::max))
    }

    /// Completion of each array string together with its share of
    /// substructures and turbines, assigned in completion order.
    pub fn complete_array_strings(&self) -> BosResult<EnergizePoints> {
        let strings = self.parse_logs(ProgressTag::ArrayString)?;
        let subs = self.parse_logs(ProgressTag::Substructure)?;
        let turbines = self.parse_logs(ProgressTag::Turbine)?;

        let per_string = turbines.len().div_ceil(strings.len());
        let sub_max = chunk_max(&subs, per_string);
        let turbine_max = chunk_max(&turbines, per_string);
        let counts: Vec<usize> = turbines.chunks(per_string).map(<[f64]>::len).collect();

        let times = strings
            .iter()
            .zip(&sub_max)
            .zip(&turbine_max)
            .map(|((s, b), t)| s.max(*b).max(*t))
            .collect();
        Ok(EnergizePoints {
            times,
            turbines: counts,
        })
    }

    pub fn energize_points(&self) -> BosResult<EnergizePoints> {
        let export = self.complete_export_system()?;
        let mut points = self.complete_array_strings()?;
        for t in &mut points.times {
            *t = t.max(export);
        }
        Ok(points)
    }
}
