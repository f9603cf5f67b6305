//! Installation phases.
//!
//! A single vessel works through a fixed task sequence. Weather-limited
//! tasks wait for the first hourly window in which the wind stays at or
//! below the vessel's limit for the whole task, and the wait is logged and
//! charged like any other task.

use crate::error::{BosError, BosResult};
use crate::log::{LogEntry, LogLevel, PhaseLog, ProgressTag};
use crate::params::Params;
use crate::phase::{PhaseKind, PhaseOutcome};
use crate::vessels::Vessel;
use crate::weather::WeatherProfile;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};
use wt_core::units::constants::HOURS_PER_MONTH;

/// Cable mass per km used for cargo planning (t/km)
const CABLE_LINEAR_DENSITY: f64 = 35.0;

pub(crate) fn run(
    kind: PhaseKind,
    name: &str,
    config: &Map<String, Value>,
    weather: Option<&WeatherProfile>,
) -> BosResult<PhaseOutcome> {
    let p = Params::new(name, config);
    let outcome = match kind {
        PhaseKind::MonopileInstallation => monopiles(&p, weather)?,
        PhaseKind::TurbineInstallation => turbines(&p, weather)?,
        PhaseKind::OffshoreSubstationInstallation => substations(&p, weather)?,
        PhaseKind::ArrayCableInstallation => array_cables(&p, weather)?,
        PhaseKind::ExportCableInstallation => export_cables(&p, weather)?,
        PhaseKind::ScourProtectionInstallation => scour_protection(&p, weather)?,
        _ => return Err(p.invalid(&[], format!("{kind} is not an installation phase"))),
    };
    debug!(phase = name, cost = outcome.cost, time = outcome.time, "installation phase complete");
    Ok(outcome)
}

/// Clock, log and weather state of one vessel.
struct VesselRun<'a> {
    phase: &'a str,
    vessel: Vessel,
    wind: Option<&'a [f64]>,
    time: f64,
    working: f64,
    waiting: f64,
    log: PhaseLog,
}

impl<'a> VesselRun<'a> {
    fn new(phase: &'a str, vessel: Vessel, weather: Option<&'a WeatherProfile>) -> Self {
        Self {
            phase,
            vessel,
            wind: weather.map(WeatherProfile::windspeed),
            time: 0.0,
            working: 0.0,
            waiting: 0.0,
            log: PhaseLog::new(),
        }
    }

    fn record(&mut self, action: &str, duration: f64, progress: Option<ProgressTag>) {
        self.time += duration;
        self.log.push(LogEntry {
            time: self.time,
            level: LogLevel::Action,
            phase: self.phase.to_string(),
            agent: Some(self.vessel.name.clone()),
            action: action.to_string(),
            cost: Some(duration * self.vessel.hourly_rate()),
            duration: Some(duration),
            progress,
        });
    }

    fn window_clear(&self, wind: &[f64], start: f64, duration: f64) -> Option<bool> {
        let first = start.floor() as usize;
        let last = ((start + duration).ceil() as usize).max(first + 1);
        let hours = wind.get(first..last)?;
        Some(hours.iter().all(|&w| w <= self.vessel.max_windspeed))
    }

    /// Start of the first window that fits `duration`, from the current time.
    fn next_window(&self, wind: &[f64], action: &str, duration: f64) -> BosResult<f64> {
        let not_found = || BosError::WeatherWindow {
            phase: self.phase.to_string(),
            task: action.to_string(),
        };
        match self.window_clear(wind, self.time, duration) {
            Some(true) => return Ok(self.time),
            Some(false) => {}
            None => return Err(not_found()),
        }
        let mut hour = self.time.floor() + 1.0;
        loop {
            match self.window_clear(wind, hour, duration) {
                Some(true) => return Ok(hour),
                Some(false) => hour += 1.0,
                None => return Err(not_found()),
            }
        }
    }

    fn task(&mut self, action: &str, duration: f64) -> BosResult<()> {
        self.perform(action, duration, true, None)
    }

    fn task_unconstrained(&mut self, action: &str, duration: f64) -> BosResult<()> {
        self.perform(action, duration, false, None)
    }

    fn perform(
        &mut self,
        action: &str,
        duration: f64,
        constrained: bool,
        progress: Option<ProgressTag>,
    ) -> BosResult<()> {
        if duration <= 0.0 {
            return Ok(());
        }
        if constrained && let Some(wind) = self.wind {
            let start = self.next_window(wind, action, duration)?;
            let delay = start - self.time;
            if delay > 0.0 {
                trace!(phase = self.phase, action, delay, "waiting for weather");
                self.waiting += delay;
                self.record("Delay: Weather", delay, None);
            }
        }
        self.working += duration;
        self.record(action, duration, progress);
        Ok(())
    }

    fn transit(&mut self, distance: f64, to_site: bool) -> BosResult<()> {
        let hours = distance / self.vessel.transit_speed;
        self.task(if to_site { "Transit to Site" } else { "Transit to Port" }, hours)
    }

    /// Close out the phase: port rental over the elapsed months and the
    /// vessel's share of time spent working.
    fn finish(mut self, p: &Params<'_>) -> BosResult<PhaseOutcome> {
        let monthly_rate = p.f64_or(&["port", "monthly_rate"], 0.0)?;
        if monthly_rate > 0.0 && self.time > 0.0 {
            self.log.push(LogEntry {
                time: self.time,
                level: LogLevel::Info,
                phase: self.phase.to_string(),
                agent: None,
                action: "Port Rental".into(),
                cost: Some(self.time / HOURS_PER_MONTH * monthly_rate),
                duration: None,
                progress: None,
            });
        }
        let busy = self.working + self.waiting;
        let efficiency = if busy > 0.0 { self.working / busy } else { 1.0 };
        let mut detailed = Map::new();
        detailed.insert(
            format!("{}_operational_efficiency", self.vessel.name),
            json!(efficiency),
        );
        Ok(PhaseOutcome {
            cost: self.log.total_cost(),
            time: self.time,
            logs: self.log,
            design_result: Map::new(),
            detailed_output: detailed,
        })
    }
}

/// Units that fit on one trip, limited by cargo mass and deck area.
fn per_trip(p: &Params<'_>, vessel: &Vessel, what: &str, mass: f64, area: f64) -> BosResult<usize> {
    let by_mass = if mass > 0.0 { (vessel.max_cargo / mass).floor() } else { f64::INFINITY };
    let by_area = if area > 0.0 { (vessel.deck_space / area).floor() } else { f64::INFINITY };
    let n = by_mass.min(by_area);
    if n < 1.0 {
        return Err(p.invalid(&[what], format!("does not fit on {}", vessel.name)));
    }
    Ok(if n.is_finite() { n as usize } else { usize::MAX })
}

/// Sizes of consecutive trips carrying `total` units.
fn trips(total: usize, per_trip: usize) -> impl Iterator<Item = usize> {
    (0..total)
        .step_by(per_trip.max(1))
        .map(move |start| per_trip.min(total - start))
}

fn jackup_time(p: &Params<'_>, depth: f64) -> BosResult<f64> {
    let rate = p.kwarg("site_jackup_rate", 10.0)?;
    Ok((depth + 10.0) / rate)
}

fn monopiles(p: &Params<'_>, weather: Option<&WeatherProfile>) -> BosResult<PhaseOutcome> {
    let vessel = Vessel::from_config(p, "wtiv", "example_wtiv")?;
    let depth = p.positive(&["site", "depth"])?;
    let distance = p.positive(&["site", "distance"])?;
    let n = p.count(&["plant", "num_turbines"])?;
    let mp_length = p.positive(&["monopile", "length"])?;
    let mp_mass = p.positive(&["monopile", "weight"])?;
    let mp_area = p.f64_or(&["monopile", "deck_space"], 0.0)?;
    let tp_mass = p.positive(&["transition_piece", "weight"])?;
    let tp_area = p.f64_or(&["transition_piece", "deck_space"], 0.0)?;

    let load_mp = p.kwarg("mono_fasten_time", 12.0)?;
    let load_tp = p.kwarg("tp_fasten_time", 8.0)?;
    let drive_rate = p.kwarg("mono_drive_rate", 20.0)?;
    let upend = p.kwarg("mono_upend_time", 2.0)?;
    let tp_bolt = p.kwarg("tp_bolt_time", 4.0)?;
    let position = p.kwarg("site_position_time", 2.0)?;
    let jackup = jackup_time(p, depth)?;

    let cap = per_trip(p, &vessel, "monopile", mp_mass + tp_mass, mp_area + tp_area)?;
    let mut run = VesselRun::new(p.phase(), vessel, weather);
    for batch in trips(n, cap) {
        for _ in 0..batch {
            run.task_unconstrained("Fasten Monopile", load_mp)?;
            run.task_unconstrained("Fasten Transition Piece", load_tp)?;
        }
        run.transit(distance, true)?;
        for _ in 0..batch {
            run.task("Position Onsite", position)?;
            run.task("Jackup", jackup)?;
            run.task("Upend Monopile", upend)?;
            run.task("Drive Monopile", (mp_length - depth).max(0.0) / drive_rate)?;
            run.perform("Bolt Transition Piece", tp_bolt, true, Some(ProgressTag::Substructure))?;
            run.task("Jackdown", jackup)?;
        }
        run.transit(distance, false)?;
    }
    run.finish(p)
}

fn turbines(p: &Params<'_>, weather: Option<&WeatherProfile>) -> BosResult<PhaseOutcome> {
    let vessel = Vessel::from_config(p, "wtiv", "example_wtiv")?;
    let depth = p.positive(&["site", "depth"])?;
    let distance = p.positive(&["site", "distance"])?;
    let n = p.count(&["plant", "num_turbines"])?;
    let hub_height = p.positive(&["turbine", "hub_height"])?;
    let tower = p.f64_or(&["turbine", "tower_weight"], 400.0)?;
    let nacelle = p.f64_or(&["turbine", "nacelle_weight"], 400.0)?;
    let blade = p.f64_or(&["turbine", "blade_weight"], 50.0)?;
    let area = p.f64_or(&["turbine", "deck_space"], 1000.0)?;

    let fasten = p.kwarg("tower_fasten_time", 4.0)?;
    let crane_rate = p.kwarg("crane_rate", 100.0)?;
    let tower_attach = p.kwarg("tower_section_attach_time", 6.0)?;
    let nacelle_attach = p.kwarg("nacelle_attach_time", 6.0)?;
    let blade_attach = p.kwarg("blade_attach_time", 3.5)?;
    let position = p.kwarg("site_position_time", 2.0)?;
    let jackup = jackup_time(p, depth)?;
    let lift = hub_height / crane_rate;

    let cap = per_trip(p, &vessel, "turbine", tower + nacelle + 3.0 * blade, area)?;
    let mut run = VesselRun::new(p.phase(), vessel, weather);
    for batch in trips(n, cap) {
        for _ in 0..batch {
            run.task_unconstrained("Fasten Tower", fasten)?;
            run.task_unconstrained("Fasten Nacelle", fasten)?;
            run.task_unconstrained("Fasten Blades", 3.0 * fasten / 2.0)?;
        }
        run.transit(distance, true)?;
        for _ in 0..batch {
            run.task("Position Onsite", position)?;
            run.task("Jackup", jackup)?;
            run.task("Lift Tower", lift)?;
            run.task("Attach Tower", tower_attach)?;
            run.task("Lift Nacelle", lift)?;
            run.task("Attach Nacelle", nacelle_attach)?;
            for b in 1..=3 {
                run.task("Lift Blade", lift)?;
                let tag = (b == 3).then_some(ProgressTag::Turbine);
                run.perform("Attach Blade", blade_attach, true, tag)?;
            }
            run.task("Jackdown", jackup)?;
        }
        run.transit(distance, false)?;
    }
    run.finish(p)
}

fn substations(p: &Params<'_>, weather: Option<&WeatherProfile>) -> BosResult<PhaseOutcome> {
    let vessel = Vessel::from_config(p, "oss_install_vessel", "example_heavy_lift_vessel")?;
    let depth = p.positive(&["site", "depth"])?;
    let distance = p.positive(&["site", "distance"])?;
    let n = p.count(&["offshore_substation", "num_substations"])?;
    let topside = p.positive(&["offshore_substation", "topside_mass"])?;
    let substructure = p.positive(&["offshore_substation", "substructure_mass"])?;

    let fasten = p.kwarg("topside_fasten_time", 12.0)?;
    let pile_rate = p.kwarg("mono_drive_rate", 20.0)?;
    let lift = p.kwarg("topside_attach_time", 24.0)?;
    let position = p.kwarg("site_position_time", 2.0)?;

    per_trip(p, &vessel, "offshore_substation", topside + substructure, 0.0)?;
    let mut run = VesselRun::new(p.phase(), vessel, weather);
    for _ in 0..n {
        run.task_unconstrained("Fasten Substructure", fasten)?;
        run.task_unconstrained("Fasten Topside", fasten)?;
        run.transit(distance, true)?;
        run.task("Position Onsite", position)?;
        run.task("Install Substructure", (depth + 30.0) / pile_rate + 12.0)?;
        run.perform("Attach Topside", lift, true, Some(ProgressTag::OffshoreSubstation))?;
        run.transit(distance, false)?;
    }
    run.finish(p)
}

fn array_cables(p: &Params<'_>, weather: Option<&WeatherProfile>) -> BosResult<PhaseOutcome> {
    let vessel = Vessel::from_config(p, "array_cable_install_vessel", "example_cable_lay_vessel")?;
    let distance = p.positive(&["site", "distance"])?;
    let lengths = p.f64_list(&["array_system", "string_lengths"])?;
    let counts = p.f64_list(&["array_system", "turbines_per_string"])?;
    if counts.len() != lengths.len() {
        return Err(p.invalid(&["array_system", "string_lengths"], "needs one length per string"));
    }

    let load_rate = p.kwarg("cable_load_rate", 6.0)?;
    let lay_rate = p.kwarg("cable_lay_rate", 0.4)?;
    let pull_in = p.kwarg("cable_pull_in_time", 5.5)?;
    let terminate = p.kwarg("cable_termination_time", 5.5)?;

    let longest = lengths.iter().copied().fold(0.0, f64::max);
    per_trip(p, &vessel, "array_system", longest * CABLE_LINEAR_DENSITY, 0.0)?;
    let mut run = VesselRun::new(p.phase(), vessel, weather);

    let mut i = 0;
    while i < lengths.len() {
        let mut carried = 0.0;
        let mut j = i;
        while j < lengths.len()
            && (carried + lengths[j]) * CABLE_LINEAR_DENSITY <= run.vessel.max_cargo
        {
            carried += lengths[j];
            j += 1;
        }
        run.task_unconstrained("Load Cable", carried / load_rate)?;
        run.transit(distance, true)?;
        for (length, turbines) in lengths[i..j].iter().zip(&counts[i..j]) {
            // One section per turbine, each pulled in at both ends
            let sections = turbines.max(1.0);
            run.task("Lay Cable", length / lay_rate)?;
            for _ in 0..sections as usize {
                run.task("Pull In Cable", 2.0 * pull_in)?;
            }
            run.perform(
                "Terminate Cable",
                terminate * sections,
                true,
                Some(ProgressTag::ArrayString),
            )?;
        }
        run.transit(distance, false)?;
        i = j;
    }
    run.finish(p)
}

fn export_cables(p: &Params<'_>, weather: Option<&WeatherProfile>) -> BosResult<PhaseOutcome> {
    let vessel = Vessel::from_config(p, "export_cable_install_vessel", "example_cable_lay_vessel")?;
    let distance = p.positive(&["site", "distance"])?;
    let n = p.count(&["export_system", "num_cables"])?;
    let length = p.positive(&["export_system", "cable_length"])?;

    let load_rate = p.kwarg("cable_load_rate", 6.0)?;
    let lay_rate = p.kwarg("cable_lay_rate", 0.4)?;
    let landfall = p.kwarg("onshore_construction_time", 48.0)?;
    let pull_in = p.kwarg("cable_pull_in_time", 5.5)?;
    let terminate = p.kwarg("cable_termination_time", 5.5)?;

    let cap = per_trip(p, &vessel, "export_system", length * CABLE_LINEAR_DENSITY, 0.0)?;
    let mut run = VesselRun::new(p.phase(), vessel, weather);
    run.task_unconstrained("Onshore Construction", landfall)?;
    for batch in trips(n, cap) {
        run.task_unconstrained("Load Cable", batch as f64 * length / load_rate)?;
        run.transit(distance, true)?;
        for _ in 0..batch {
            run.task("Pull In Cable at Landfall", pull_in)?;
            run.task("Lay Cable", length / lay_rate)?;
            run.task("Pull In Cable at Substation", pull_in)?;
            run.perform("Terminate Cable", terminate, true, Some(ProgressTag::ExportSystem))?;
        }
        run.transit(distance, false)?;
    }
    run.finish(p)
}

fn scour_protection(p: &Params<'_>, weather: Option<&WeatherProfile>) -> BosResult<PhaseOutcome> {
    let vessel = Vessel::from_config(
        p,
        "scour_protection_install_vessel",
        "example_scour_protection_vessel",
    )?;
    let distance = p.positive(&["site", "distance"])?;
    let n = p.count(&["plant", "num_turbines"])?;
    let tonnes = p.positive(&["scour_protection", "tonnes_per_substructure"])?;

    let load = p.kwarg("load_rock_time", 4.0)?;
    let drop = p.kwarg("drop_rock_time", 10.0)?;
    let position = p.kwarg("site_position_time", 2.0)?;

    let cap = per_trip(p, &vessel, "scour_protection", tonnes, 0.0)?;
    let mut run = VesselRun::new(p.phase(), vessel, weather);
    for batch in trips(n, cap) {
        run.task_unconstrained("Load Scour Protection Material", load)?;
        run.transit(distance, true)?;
        for _ in 0..batch {
            run.task("Position Onsite", position)?;
            run.task("Drop Scour Protection Material", drop)?;
        }
        run.transit(distance, false)?;
    }
    run.finish(p)
}
