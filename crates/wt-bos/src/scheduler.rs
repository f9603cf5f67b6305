//! Installation phase ordering.
//!
//! The scheduler only decides start times. Running a phase is delegated to a
//! callback that returns its duration, or the failure classification when
//! per-phase failures are being caught.

use crate::error::{BosError, BosResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use wt_project::ValidationError;

/// Recorded for a phase whose dependency failed.
pub const DEPENDENCY_FAILED: &str = "PhaseDependencyFailed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseRun {
    Completed { duration: f64 },
    Failed { kind: String },
}

impl PhaseRun {
    pub fn duration(&self) -> Option<f64> {
        match self {
            PhaseRun::Completed { duration } => Some(*duration),
            PhaseRun::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub target: String,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPhase {
    pub name: String,
    /// Hours on the weather profile clock
    pub start: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Dependency>,
    pub run: PhaseRun,
}

/// Phases in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Earliest defined start; logs are shifted so this is time zero
    pub zero: f64,
    pub phases: Vec<ScheduledPhase>,
}

impl Schedule {
    pub fn get(&self, name: &str) -> Option<&ScheduledPhase> {
        self.phases.iter().find(|p| p.name == name)
    }

    fn push(&mut self, name: &str, start: f64, dependency: Option<Dependency>, run: PhaseRun) {
        self.phases.push(ScheduledPhase {
            name: name.to_string(),
            start,
            dependency,
            run,
        });
    }
}

/// Run phases back to back. Each start is the previous start plus its
/// duration, rounded up to the hour; a failed phase does not advance the
/// clock.
pub fn run_serial<F>(names: &[String], mut run: F) -> BosResult<Schedule>
where
    F: FnMut(&str, f64) -> BosResult<PhaseRun>,
{
    let mut schedule = Schedule::default();
    let mut start = 0.0_f64;
    for name in names {
        let result = run(name.as_str(), start)?;
        let next = result.duration().map(|d| (start + d).ceil());
        schedule.push(name, start, None, result);
        if let Some(next) = next {
            start = next;
        }
    }
    info!(phases = names.len(), end = start, "serial schedule complete");
    Ok(schedule)
}

/// Run phases with defined starts, then resolve dependent phases pass by
/// pass until all have run or a pass makes no progress.
pub fn run_overlapping<F>(
    defined: &[(String, f64)],
    dependent: &[(String, Dependency)],
    mut run: F,
) -> BosResult<Schedule>
where
    F: FnMut(&str, f64) -> BosResult<PhaseRun>,
{
    let zero = defined
        .iter()
        .map(|(_, s)| *s)
        .reduce(f64::min)
        .ok_or(ValidationError::NoDefinedStart)?;

    let mut schedule = Schedule {
        zero,
        phases: Vec::new(),
    };
    // name -> (start, run)
    let mut finished: HashMap<String, (f64, PhaseRun)> = HashMap::new();

    for (name, start) in defined {
        let result = run(name.as_str(), *start)?;
        finished.insert(name.clone(), (*start, result.clone()));
        schedule.push(name, *start, None, result);
    }

    let mut pending: Vec<&(String, Dependency)> = dependent.iter().collect();
    while !pending.is_empty() {
        let mut waiting = Vec::new();
        let before = pending.len();
        for entry in pending {
            let (name, dep) = entry;
            let Some((target_start, target_run)) = finished.get(&dep.target).cloned() else {
                waiting.push(entry);
                continue;
            };
            let (start, result) = match target_run.duration() {
                Some(duration) => {
                    let start = target_start + duration * dep.fraction;
                    (start, run(name.as_str(), start)?)
                }
                None => {
                    warn!(phase = %name, target = %dep.target, "dependency failed, phase skipped");
                    (
                        target_start,
                        PhaseRun::Failed {
                            kind: DEPENDENCY_FAILED.to_string(),
                        },
                    )
                }
            };
            finished.insert(name.clone(), (start, result.clone()));
            schedule.push(name, start, Some(dep.clone()), result);
        }
        if waiting.len() == before {
            return Err(BosError::DependenciesInvalid {
                phases: waiting.iter().map(|(n, _)| n.clone()).collect(),
            });
        }
        pending = waiting;
    }
    info!(phases = schedule.phases.len(), zero, "overlapping schedule complete");
    Ok(schedule)
}
