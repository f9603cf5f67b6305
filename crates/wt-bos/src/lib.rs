//! wt-bos: offshore balance-of-system project simulation.
//!
//! Design phases size the plant's systems, installation phases simulate the
//! vessels that build it, and the financial aggregator turns the resulting
//! logs into monthly cash flow, NPV and CAPEX.

pub mod compile;
mod design;
pub mod error;
pub mod financial;
mod install;
pub mod log;
pub mod manager;
mod params;
pub mod phase;
pub mod progress;
pub mod scheduler;
pub mod vessels;
pub mod weather;

pub use compile::compile_input_dict;
pub use error::{BosError, BosResult};
pub use financial::{CapexBreakdown, FinancialAggregator, Monthly};
pub use log::{LogEntry, LogLevel, PhaseLog, ProgressTag};
pub use manager::{PhaseDates, PhaseRecord, PhaseResult, ProjectManager, ProjectRun, phase_config};
pub use phase::{PhaseCategory, PhaseKind, PhaseOutcome};
pub use progress::{EnergizePoints, ProjectProgress};
pub use scheduler::{Dependency, PhaseRun, Schedule, ScheduledPhase};
pub use vessels::Vessel;
pub use weather::WeatherProfile;
