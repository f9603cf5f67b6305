mod compile;
mod error;

use clap::{Parser, Subcommand};
use compile::{RotorModel, compile_rotor};
use error::{CliError, CliResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uom::si::energy::kilowatt_hour;
use wt_bos::{FinancialAggregator, PhaseResult, ProjectManager, WeatherProfile, compile_input_dict};
use wt_rotor::{
    AepIntegrator, OperatingPoint, PowerCurve, PowerCurveSolver, RegionBoundaries, generate_tables,
};
use wt_windfield::WindField;

#[derive(Parser)]
#[command(name = "wt")]
#[command(about = "Wind turbine rotor performance and offshore project modelling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the regulated power curve of a rotor
    PowerCurve {
        /// Path to the rotor YAML or JSON file
        rotor_path: PathBuf,
        /// Write the full curve as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Generate Cp/Ct/Cq tables over TSR, pitch and wind speed
    Tables {
        /// Path to the rotor YAML or JSON file
        rotor_path: PathBuf,
        /// Write the tables as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Annual energy production from the power curve and wind distribution
    Aep {
        /// Path to the rotor YAML or JSON file
        rotor_path: PathBuf,
    },
    /// Run the design and installation phases of an offshore project
    Project {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Hourly weather CSV (datetime, windspeed)
        #[arg(long)]
        weather: Option<PathBuf>,
        /// Record failing phases instead of aborting the run
        #[arg(long)]
        catch_failures: bool,
        /// Write the full run as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print the input template for a set of phases
    Inputs {
        /// Phase names, e.g. MonopileDesign TurbineInstallation
        #[arg(required = true)]
        phases: Vec<String>,
    },
    /// Summarize a binary full-field wind file
    Windfield {
        /// Path to the .bts file
        path: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::PowerCurve { rotor_path, json } => cmd_power_curve(&rotor_path, json.as_deref()),
        Commands::Tables { rotor_path, json } => cmd_tables(&rotor_path, json.as_deref()),
        Commands::Aep { rotor_path } => cmd_aep(&rotor_path),
        Commands::Project {
            project_path,
            weather,
            catch_failures,
            json,
        } => cmd_project(&project_path, weather.as_deref(), catch_failures, json.as_deref()),
        Commands::Inputs { phases } => cmd_inputs(&phases),
        Commands::Windfield { path } => cmd_windfield(&path),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).map_err(|source| CliError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })?;
    println!("✓ Wrote {}", path.display());
    Ok(())
}

fn load_model(rotor_path: &Path) -> CliResult<RotorModel> {
    let file = wt_project::load_rotor(rotor_path)?;
    compile_rotor(&file)
}

fn solve(model: &RotorModel) -> CliResult<PowerCurve> {
    let solver = PowerCurveSolver::new(&model.rotor, &model.drivetrain, model.limits, model.options);
    Ok(solver.solve()?)
}

#[derive(Serialize)]
struct RatedReport {
    wind_speed: f64,
    rotor_speed: f64,
    pitch: f64,
    thrust: f64,
    torque: f64,
}

#[derive(Serialize)]
struct PowerCurveReport<'a> {
    name: &'a str,
    rated: RatedReport,
    boundaries: RegionBoundaries,
    points: &'a [OperatingPoint],
    v_spline: &'a [f64],
    p_spline: &'a [f64],
}

fn cmd_power_curve(rotor_path: &Path, json: Option<&Path>) -> CliResult<()> {
    let model = load_model(rotor_path)?;
    let curve = solve(&model)?;

    println!("Power curve: {}", model.name);
    println!(
        "  {:>8} {:>8} {:>8} {:>12} {:>10} {:>8}",
        "U [m/s]", "Ω [rpm]", "β [deg]", "P_elec [kW]", "T [kN]", "Cp"
    );
    for p in &curve.points {
        println!(
            "  {:>8.2} {:>8.3} {:>8.3} {:>12.1} {:>10.1} {:>8.4}",
            p.wind_speed,
            p.rotor_speed,
            p.pitch,
            p.electrical_power / 1.0e3,
            p.thrust / 1.0e3,
            p.cp
        );
    }
    let rated = &curve.rated;
    println!(
        "✓ Rated at {:.2} m/s, {:.2} rpm, {:.2} deg",
        rated.wind_speed_mps(),
        rated.rotor_speed_rpm(),
        rated.pitch_deg()
    );

    if let Some(path) = json {
        let report = PowerCurveReport {
            name: &model.name,
            rated: RatedReport {
                wind_speed: rated.wind_speed_mps(),
                rotor_speed: rated.rotor_speed_rpm(),
                pitch: rated.pitch_deg(),
                thrust: rated.thrust_n(),
                torque: rated.torque_nm(),
            },
            boundaries: curve.boundaries,
            points: &curve.points,
            v_spline: &curve.v_spline,
            p_spline: &curve.p_spline,
        };
        write_json(path, &report)?;
    }
    Ok(())
}

fn cmd_tables(rotor_path: &Path, json: Option<&Path>) -> CliResult<()> {
    let model = load_model(rotor_path)?;
    let (v_in, v_out) = (model.limits.v_in.value, model.limits.v_out.value);
    let tables = generate_tables(&model.rotor, &model.grid, v_in, v_out)?;

    println!("Coefficient tables: {}", model.name);
    println!(
        "  {} TSR × {} pitch × {} wind speeds",
        tables.tsr.len(),
        tables.pitch.len(),
        tables.wind_speed.len()
    );
    let cp_max = tables
        .cp
        .iter()
        .flatten()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    println!("  max Cp = {cp_max:.4}");

    if let Some(path) = json {
        write_json(path, &tables)?;
    }
    Ok(())
}

fn cmd_aep(rotor_path: &Path) -> CliResult<()> {
    let model = load_model(rotor_path)?;
    let curve = solve(&model)?;
    let integrator = AepIntegrator::new(model.distribution, model.loss_factor)?;
    let energy = integrator.integrate(&curve)?;

    println!("AEP: {}", model.name);
    println!("  hub-height mean wind speed: {:.2} m/s", model.distribution.mean());
    println!("  loss factor: {:.3}", model.loss_factor);
    println!("✓ {:.1} MWh/yr", energy.get::<kilowatt_hour>() / 1.0e3);
    Ok(())
}

fn cmd_project(
    project_path: &Path,
    weather: Option<&Path>,
    catch_failures: bool,
    json: Option<&Path>,
) -> CliResult<()> {
    println!("Running project: {}", project_path.display());
    let config = wt_project::load_project(project_path)?;
    let weather = weather.map(WeatherProfile::from_csv_path).transpose()?;
    let run = ProjectManager::new(config, weather)?
        .catch_failures(catch_failures)
        .run()?;

    println!("  {:<36} {:>16} {:>10}", "Phase", "Cost [$]", "Time [h]");
    for phase in &run.phases {
        match &phase.result {
            PhaseResult::Completed { cost, time } => {
                println!("  {:<36} {:>16.0} {:>10.1}", phase.name, cost, time)
            }
            PhaseResult::Failed { kind } => println!("  {:<36} {:>27}", phase.name, kind),
        }
    }
    println!("  Design cost:       {:.0}", run.design_cost());
    println!("  Installation cost: {:.0}", run.installation_cost());
    println!("  Project time:      {:.1} h", run.project_time());
    for (name, dates) in run.phase_dates() {
        println!("  {name}: {} to {}", dates.start, dates.end);
    }

    let financials = FinancialAggregator::new(&run)?;
    let capex = financials.capex();
    println!("  Total CAPEX:       {:.0}", capex.total);
    if let Some(per_kw) = capex.total_per_kw {
        println!("  Total CAPEX/kW:    {per_kw:.1}");
    }
    match financials.npv() {
        Ok(npv) => println!("  NPV:               {npv:.0}"),
        Err(e) => tracing::warn!(error = %e, "NPV unavailable"),
    }
    println!("✓ Project completed");

    if let Some(path) = json {
        write_json(path, &run)?;
    }
    Ok(())
}

fn cmd_inputs(phases: &[String]) -> CliResult<()> {
    let names: Vec<&str> = phases.iter().map(String::as_str).collect();
    let template = compile_input_dict(&names)?;
    print!("{}", serde_yaml::to_string(&template)?);
    Ok(())
}

fn cmd_windfield(path: &Path) -> CliResult<()> {
    let field = WindField::from_path(path)?;
    let h = &field.header;
    let [nt, _, ny, nz] = field.shape();
    println!("Wind field: {}", path.display());
    println!("  format tag:  {}", h.format_tag);
    println!("  grid:        {ny} × {nz} ({:.2} m × {:.2} m)", h.dy, h.dz);
    println!("  tower nodes: {}", h.ntwr);
    println!("  time steps:  {nt} at {:.3} s ({:.1} s)", h.dt, nt as f32 * h.dt);
    println!("  hub height:  {:.1} m", h.hub_height);
    println!("  mean wind:   {:.2} m/s", h.mean_wind_speed);
    println!("  grid bottom: {:.1} m", h.grid_bottom);
    println!("  description: {}", h.description_text().trim());
    Ok(())
}
