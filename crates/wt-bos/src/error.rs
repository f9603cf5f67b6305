//! Error types for project simulation.

use wt_project::{ProjectError, ValidationError};

#[derive(thiserror::Error, Debug)]
pub enum BosError {
    #[error("Configuration error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("Phase(s) not found: {}", names.join(", "))]
    PhaseNotFound { names: Vec<String> },

    #[error("Phase '{phase}' is a {found} phase but was listed under {listed}")]
    WrongCategory {
        phase: String,
        found: &'static str,
        listed: &'static str,
    },

    #[error("Missing configuration for '{phase}': {key}")]
    MissingConfig { phase: String, key: String },

    #[error("Invalid configuration for '{phase}': {key} ({reason})")]
    InvalidConfig {
        phase: String,
        key: String,
        reason: String,
    },

    #[error("Unresolved phase dependencies: {}", phases.join(", "))]
    DependenciesInvalid { phases: Vec<String> },

    #[error("No weather profile configured for '{phase}' with a date start")]
    NoWeather { phase: String },

    #[error("Date {date} is outside the weather profile ({start} to {end})")]
    WeatherProfile {
        date: String,
        start: String,
        end: String,
    },

    #[error("Weather data error: {what}")]
    WeatherData { what: String },

    #[error("No weather window for '{task}' in '{phase}' before the profile ends")]
    WeatherWindow { phase: String, task: String },

    #[error("Installed '{tag}' not found in project logs")]
    MissingProgress { tag: String },

    #[error("Cash flow is empty; project lifetime must cover at least two months")]
    EmptyCashFlow,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BosError {
    /// Short classification recorded in place of cost and time for a phase
    /// that failed while failures are being caught.
    pub fn kind(&self) -> &'static str {
        match self {
            BosError::Validation(_) => "ValidationError",
            BosError::Project(_) => "ProjectError",
            BosError::PhaseNotFound { .. } => "PhaseNotFound",
            BosError::WrongCategory { .. } => "WrongCategory",
            BosError::MissingConfig { .. } => "MissingConfig",
            BosError::InvalidConfig { .. } => "InvalidConfig",
            BosError::DependenciesInvalid { .. } => "PhaseDependenciesInvalid",
            BosError::NoWeather { .. } => "NoWeather",
            BosError::WeatherProfile { .. } => "WeatherProfileError",
            BosError::WeatherData { .. } => "WeatherDataError",
            BosError::WeatherWindow { .. } => "WindowNotFound",
            BosError::MissingProgress { .. } => "MissingProgress",
            BosError::EmptyCashFlow => "EmptyCashFlow",
            BosError::Csv(_) => "CsvError",
            BosError::Io(_) => "IoError",
        }
    }
}

pub type BosResult<T> = Result<T, BosError>;
