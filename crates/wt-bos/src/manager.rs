//! Project runs: design phases, then installation phases on a schedule.

use crate::error::{BosError, BosResult};
use crate::log::{LogEntry, LogLevel, ProgressTag};
use crate::phase::{PhaseCategory, PhaseKind, PhaseOutcome};
use crate::progress::ProjectProgress;
use crate::scheduler::{self, Dependency, PhaseRun, Schedule};
use crate::weather::WeatherProfile;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};
use wt_core::digitize;
use wt_core::units::constants::HOURS_PER_MONTH;
use wt_project::{
    DATE_FORMAT_LONG, InstallPhases, PhaseStart, ProjectConfig, merge_dicts,
    resolve_project_capacity, validate_project,
};

type Dict = Map<String, Value>;

fn is_phase_key(key: &str) -> bool {
    PhaseKind::find_key_match(key).is_some()
}

/// Configuration for one phase: the general keys merged with the phase's
/// own section, which wins.
pub fn phase_config(config: &ProjectConfig, name: &str) -> Dict {
    config.phase_config(name, is_phase_key)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseResult {
    Completed { cost: f64, time: f64 },
    /// Error classification of a phase that failed while failures were
    /// being caught
    Failed { kind: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseRecord {
    pub name: String,
    pub kind: PhaseKind,
    pub category: PhaseCategory,
    /// Hours on the weather profile clock (installation phases)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    pub result: PhaseResult,
}

impl PhaseRecord {
    pub fn cost(&self) -> Option<f64> {
        match self.result {
            PhaseResult::Completed { cost, .. } => Some(cost),
            PhaseResult::Failed { .. } => None,
        }
    }

    pub fn time(&self) -> Option<f64> {
        match self.result {
            PhaseResult::Completed { time, .. } => Some(time),
            PhaseResult::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseDates {
    pub start: String,
    pub end: String,
}

pub struct ProjectManager {
    config: ProjectConfig,
    weather: Option<WeatherProfile>,
    catch_failures: bool,
}

impl ProjectManager {
    pub fn new(config: ProjectConfig, weather: Option<WeatherProfile>) -> BosResult<Self> {
        let config = resolve_project_capacity(config)?;
        validate_project(&config)?;
        Ok(Self {
            config,
            weather,
            catch_failures: false,
        })
    }

    /// Record failing phases and carry on instead of aborting the run.
    pub fn catch_failures(mut self, catch: bool) -> Self {
        self.catch_failures = catch;
        self
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Resolve every listed phase before anything runs.
    fn check_phases(design: &[String], install: &InstallPhases) -> BosResult<()> {
        let mut missing = Vec::new();
        let listed = design
            .iter()
            .map(|n| (n.as_str(), PhaseCategory::Design))
            .chain(install.names().into_iter().map(|n| (n, PhaseCategory::Install)));
        for (name, listed_as) in listed {
            let Some(kind) = PhaseKind::find_key_match(name) else {
                missing.push(name.to_string());
                continue;
            };
            if kind.category() != listed_as {
                return Err(BosError::WrongCategory {
                    phase: name.to_string(),
                    found: kind.category().as_str(),
                    listed: listed_as.as_str(),
                });
            }
        }
        if !missing.is_empty() {
            return Err(BosError::PhaseNotFound { names: missing });
        }
        Ok(())
    }

    fn weather_for(&self, phase: &str) -> BosResult<&WeatherProfile> {
        self.weather.as_ref().ok_or_else(|| BosError::NoWeather {
            phase: phase.to_string(),
        })
    }

    pub fn run(&self) -> BosResult<ProjectRun> {
        let mut config = self.config.clone();
        let design_names = config.design_phases()?;
        let install = config.install_phases()?;
        Self::check_phases(&design_names, &install)?;

        let mut records = Vec::new();
        let mut design_results = Dict::new();
        let mut detailed_outputs = Dict::new();

        for name in &design_names {
            let kind = PhaseKind::resolve(name)?;
            let cfg = phase_config(&config, name);
            let result = match self.attempt(kind, name, &cfg, None)? {
                Ok(o) => {
                    design_results = merge_dicts(&design_results, &o.design_result, false, true);
                    config.merge(&o.design_result, false);
                    detailed_outputs = merge_dicts(&detailed_outputs, &o.detailed_output, true, true);
                    info!(phase = %name, cost = o.cost, time = o.time, "design phase complete");
                    PhaseResult::Completed {
                        cost: o.cost,
                        time: o.time,
                    }
                }
                Err(failure) => PhaseResult::Failed { kind: failure },
            };
            records.push(PhaseRecord {
                name: name.clone(),
                kind,
                category: PhaseCategory::Design,
                start: None,
                result,
            });
        }

        // Starts of defined phases are indices into the weather profile
        let mut defined = Vec::new();
        let mut dependent = Vec::new();
        if let InstallPhases::Scheduled(entries) = &install {
            for (name, start) in entries {
                match start {
                    PhaseStart::Offset(h) => defined.push((name.clone(), *h)),
                    PhaseStart::Date(d) => {
                        let at = d.and_time(chrono::NaiveTime::MIN);
                        let index = self.weather_for(name)?.index_of(at)?;
                        defined.push((name.clone(), index as f64));
                    }
                    PhaseStart::After { target, fraction } => dependent.push((
                        name.clone(),
                        Dependency {
                            target: target.clone(),
                            fraction: *fraction,
                        },
                    )),
                }
            }
        }
        let zero = defined.iter().map(|(_, s)| *s).reduce(f64::min).unwrap_or(0.0);

        let mut logs: Vec<LogEntry> = Vec::new();
        let mut costs: HashMap<String, f64> = HashMap::new();
        let run_phase = |name: &str, start: f64| -> BosResult<PhaseRun> {
            let kind = PhaseKind::resolve(name)?;
            let weather = self.weather.as_ref().map(|w| w.slice_from(start));
            let cfg = phase_config(&config, name);
            Ok(match self.attempt(kind, name, &cfg, weather.as_ref())? {
                Ok(o) => {
                    logs.extend(o.logs.shifted(start - zero));
                    detailed_outputs = merge_dicts(&detailed_outputs, &o.detailed_output, true, true);
                    costs.insert(name.to_string(), o.cost);
                    info!(phase = name, start, cost = o.cost, time = o.time, "install phase complete");
                    PhaseRun::Completed { duration: o.time }
                }
                Err(failure) => PhaseRun::Failed { kind: failure },
            })
        };
        let schedule = match &install {
            InstallPhases::Serial(names) => scheduler::run_serial(names, run_phase)?,
            InstallPhases::Scheduled(_) => scheduler::run_overlapping(&defined, &dependent, run_phase)?,
        };

        for entry in &schedule.phases {
            let kind = PhaseKind::resolve(&entry.name)?;
            let result = match &entry.run {
                PhaseRun::Completed { duration } => PhaseResult::Completed {
                    cost: costs.get(&entry.name).copied().unwrap_or(0.0),
                    time: *duration,
                },
                PhaseRun::Failed { kind } => PhaseResult::Failed { kind: kind.clone() },
            };
            records.push(PhaseRecord {
                name: entry.name.clone(),
                kind,
                category: PhaseCategory::Install,
                start: Some(entry.start),
                result,
            });
        }

        Ok(ProjectRun {
            config,
            design_results,
            detailed_outputs,
            phases: records,
            schedule,
            logs,
            install_phases: install,
        })
    }

    /// Run one phase. The outer error aborts the project; the inner one is a
    /// failure caught and classified.
    fn attempt(
        &self,
        kind: PhaseKind,
        name: &str,
        config: &Dict,
        weather: Option<&WeatherProfile>,
    ) -> BosResult<Result<PhaseOutcome, String>> {
        match kind.run(name, config, weather) {
            Ok(o) => Ok(Ok(o)),
            Err(e) if self.catch_failures => {
                warn!(phase = name, error = %e, "phase failed");
                Ok(Err(e.kind().to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

/// Everything a project run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRun {
    /// Final configuration with design results merged in
    #[serde(serialize_with = "serialize_config")]
    pub config: ProjectConfig,
    pub design_results: Dict,
    pub detailed_outputs: Dict,
    /// Design phases in run order, then installation phases in schedule order
    pub phases: Vec<PhaseRecord>,
    pub schedule: Schedule,
    /// Installation logs on the project clock
    pub logs: Vec<LogEntry>,
    #[serde(skip)]
    pub install_phases: InstallPhases,
}

fn serialize_config<S: serde::Serializer>(c: &ProjectConfig, s: S) -> Result<S::Ok, S::Error> {
    c.as_map().serialize(s)
}

impl ProjectRun {
    pub fn phase(&self, name: &str) -> Option<&PhaseRecord> {
        self.phases.iter().find(|p| p.name == name)
    }

    fn completed(&self, category: PhaseCategory) -> impl Iterator<Item = &PhaseRecord> {
        self.phases
            .iter()
            .filter(move |p| p.category == category && p.cost().is_some())
    }

    /// Sum of installation phase times, ignoring overlap.
    pub fn installation_time(&self) -> f64 {
        self.completed(PhaseCategory::Install).filter_map(PhaseRecord::time).sum()
    }

    /// Time of the latest log entry.
    pub fn project_time(&self) -> f64 {
        self.logs.iter().map(|e| e.time).fold(0.0, f64::max)
    }

    pub fn capacity(&self) -> Option<f64> {
        self.config.capacity()
    }

    /// Cost of each completed phase, in run order.
    pub fn phase_costs(&self) -> Vec<(&str, f64)> {
        self.phases
            .iter()
            .filter_map(|p| Some((p.name.as_str(), p.cost()?)))
            .collect()
    }

    pub fn phase_costs_per_kw(&self) -> Option<Vec<(&str, f64)>> {
        let kw = self.capacity()? * 1000.0;
        Some(self.phase_costs().into_iter().map(|(n, c)| (n, c / kw)).collect())
    }

    pub fn design_cost(&self) -> f64 {
        self.completed(PhaseCategory::Design).filter_map(PhaseRecord::cost).sum()
    }

    pub fn installation_cost(&self) -> f64 {
        self.completed(PhaseCategory::Install).filter_map(PhaseRecord::cost).sum()
    }

    /// Calendar start and end of phases started on a date.
    pub fn phase_dates(&self) -> BTreeMap<String, PhaseDates> {
        let InstallPhases::Scheduled(entries) = &self.install_phases else {
            return BTreeMap::new();
        };
        entries
            .iter()
            .filter_map(|(name, start)| {
                let PhaseStart::Date(d) = start else { return None };
                let time = self.phase(name)?.time()?;
                let start = d.and_time(chrono::NaiveTime::MIN);
                let end = start + chrono::Duration::hours(time.ceil() as i64);
                Some((
                    name.clone(),
                    PhaseDates {
                        start: start.format(DATE_FORMAT_LONG).to_string(),
                        end: end.format(DATE_FORMAT_LONG).to_string(),
                    },
                ))
            })
            .collect()
    }

    /// ACTION entries ordered by time.
    pub fn project_actions(&self) -> Vec<&LogEntry> {
        let mut actions: Vec<&LogEntry> = self
            .logs
            .iter()
            .filter(|e| e.level == LogLevel::Action)
            .collect();
        actions.sort_by(|a, b| a.time.total_cmp(&b.time));
        actions
    }

    pub fn progress_logs(&self) -> Vec<(ProgressTag, f64)> {
        self.logs
            .iter()
            .filter_map(|e| Some((e.progress?, e.time)))
            .collect()
    }

    pub fn progress(&self) -> ProjectProgress {
        ProjectProgress::new(self.progress_logs())
    }

    /// Month bin edges `0, 730, ...` reaching past the last log entry.
    pub fn month_bins(&self) -> Vec<f64> {
        let end = self.project_time() + HOURS_PER_MONTH;
        (0..)
            .map(|i| i as f64 * HOURS_PER_MONTH)
            .take_while(|b| *b < end)
            .collect()
    }

    /// Count of each progress tag per month, months numbered from 1.
    pub fn progress_summary(&self) -> BTreeMap<usize, BTreeMap<ProgressTag, usize>> {
        let bins = self.month_bins();
        let mut summary: BTreeMap<usize, BTreeMap<ProgressTag, usize>> =
            (1..bins.len()).map(|i| (i, BTreeMap::new())).collect();
        for (tag, time) in self.progress_logs() {
            let month = digitize(time.trunc(), &bins);
            if let Some(counts) = summary.get_mut(&month) {
                *counts.entry(tag).or_default() += 1;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(v: Value) -> ProjectConfig {
        ProjectConfig::from_value(v).unwrap()
    }

    fn base() -> Value {
        json!({
            "site": {"depth": 25, "distance": 50, "distance_to_landfall": 40},
            "plant": {"num_turbines": 6, "turbine_spacing": 7},
            "turbine": {
                "turbine_rating": 6, "rotor_diameter": 154,
                "hub_height": 110, "rated_windspeed": 11.5
            },
            "design_phases": ["MonopileDesign"],
            "install_phases": ["MonopileInstallation", "TurbineInstallation"]
        })
    }

    #[test]
    fn capacity_is_resolved_on_construction() {
        let m = ProjectManager::new(config(base()), None).unwrap();
        assert_eq!(m.config().capacity(), Some(36.0));
    }

    #[test]
    fn design_results_feed_installation() {
        let run = ProjectManager::new(config(base()), None).unwrap().run().unwrap();
        assert!(run.design_results.contains_key("monopile"));
        assert!(run.config.get_path(&["monopile", "weight"]).is_some());
        let mono = run.phase("MonopileInstallation").unwrap();
        let turb = run.phase("TurbineInstallation").unwrap();
        assert_eq!(mono.start, Some(0.0));
        assert_eq!(turb.start, Some(mono.time().unwrap().ceil()));
        assert!((run.installation_time() - mono.time().unwrap() - turb.time().unwrap()).abs() < 1e-9);
        assert!(run.project_time() > run.installation_time() - 1.0);
        assert_eq!(run.phase_costs().len(), 3);
    }

    #[test]
    fn existing_keys_are_not_overwritten_by_design() {
        let mut v = base();
        v["monopile"] = json!({"diameter": 7.0});
        let run = ProjectManager::new(config(v), None).unwrap().run().unwrap();
        assert_eq!(run.config.get_f64(&["monopile", "diameter"]), Some(7.0));
        assert!(run.config.get_f64(&["monopile", "length"]).is_some());
    }

    #[test]
    fn phase_sections_override_general_config() {
        let mut v = base();
        v["TurbineInstallation"] = json!({"site": {"distance": 500}});
        let c = config(v);
        let cfg = phase_config(&c, "TurbineInstallation");
        assert_eq!(cfg["site"]["distance"], json!(500));
        assert_eq!(cfg["site"]["depth"], json!(25));
        assert!(!cfg.contains_key("TurbineInstallation"));
    }

    #[test]
    fn unknown_phases_are_reported_together() {
        let mut v = base();
        v["install_phases"] = json!(["Nope", "TurbineInstallation", "AlsoNope"]);
        let err = ProjectManager::new(config(v), None).unwrap().run().unwrap_err();
        match err {
            BosError::PhaseNotFound { names } => assert_eq!(names, vec!["Nope", "AlsoNope"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn design_phase_listed_as_install_is_rejected() {
        let mut v = base();
        v["install_phases"] = json!(["MonopileDesign"]);
        let err = ProjectManager::new(config(v), None).unwrap().run().unwrap_err();
        assert!(matches!(err, BosError::WrongCategory { .. }));
    }

    #[test]
    fn caught_failures_are_recorded() {
        let mut v = base();
        v["design_phases"] = json!([]);
        let m = ProjectManager::new(config(v.clone()), None).unwrap();
        assert!(m.run().is_err());

        let run = ProjectManager::new(config(v), None)
            .unwrap()
            .catch_failures(true)
            .run()
            .unwrap();
        let mono = run.phase("MonopileInstallation").unwrap();
        assert_eq!(mono.result, PhaseResult::Failed { kind: "MissingConfig".into() });
        // Serial clock does not advance past a failure
        assert_eq!(run.phase("TurbineInstallation").unwrap().start, Some(0.0));
    }

    #[test]
    fn date_start_needs_weather() {
        let mut v = base();
        v["install_phases"] = json!({"MonopileInstallation": "01/01/2000"});
        let err = ProjectManager::new(config(v), None).unwrap().run().unwrap_err();
        assert!(matches!(err, BosError::NoWeather { .. }));
    }

    #[test]
    fn overlapping_phases_share_a_clock() {
        let mut v = base();
        v["install_phases"] = json!({
            "MonopileInstallation": 24,
            "TurbineInstallation": ["MonopileInstallation", 0.5]
        });
        let run = ProjectManager::new(config(v), None).unwrap().run().unwrap();
        assert_eq!(run.schedule.zero, 24.0);
        let mono = run.phase("MonopileInstallation").unwrap();
        let turb = run.phase("TurbineInstallation").unwrap();
        assert_eq!(turb.start, Some(24.0 + 0.5 * mono.time().unwrap()));
        // Logs start at the first defined phase
        let first = run.logs.iter().map(|e| e.time).fold(f64::INFINITY, f64::min);
        assert!(first < 24.0);
    }

    #[test]
    fn dates_are_reported_for_date_starts() {
        let mut v = base();
        v["install_phases"] = json!({
            "MonopileInstallation": "01/02/2000",
            "TurbineInstallation": ["MonopileInstallation", 1.0]
        });
        let weather = WeatherProfile::hourly(vec![5.0; 24 * 400]);
        let run = ProjectManager::new(config(v), Some(weather)).unwrap().run().unwrap();
        assert_eq!(run.phase("MonopileInstallation").unwrap().start, Some(24.0));
        let dates = run.phase_dates();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates["MonopileInstallation"].start, "01/02/2000 00:00");
    }

    #[test]
    fn actions_are_sorted_and_summarized() {
        let mut v = base();
        v["install_phases"] = json!({
            "TurbineInstallation": 0,
            "MonopileInstallation": 0
        });
        let run = ProjectManager::new(config(v), None).unwrap().run().unwrap();
        let actions = run.project_actions();
        assert!(actions.windows(2).all(|w| w[0].time <= w[1].time));
        let summary = run.progress_summary();
        let turbines: usize = summary.values().filter_map(|m| m.get(&ProgressTag::Turbine)).sum();
        assert_eq!(turbines, 6);
        assert!(*run.month_bins().last().unwrap() >= run.project_time());
    }
}
