//! Error type for the command-line front end.

use std::path::PathBuf;
use wt_aero::AeroError;
use wt_bos::BosError;
use wt_project::ProjectError;
use wt_rotor::RotorError;
use wt_windfield::WindFieldError;

pub type CliResult<T> = Result<T, CliError>;

/// Wraps the library errors so every command can use `?`.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Bos(#[from] BosError),

    #[error(transparent)]
    Rotor(#[from] RotorError),

    #[error(transparent)]
    Aero(#[from] AeroError),

    #[error(transparent)]
    WindField(#[from] WindFieldError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to write output file: {path}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
