//! wt-project: rotor and offshore project configuration files.

pub mod capacity;
pub mod config;
pub mod economics;
pub mod phases;
pub mod schema;
pub mod validate;

pub use capacity::resolve_project_capacity;
pub use config::{ProjectConfig, merge_dicts, remove_keys};
pub use economics::EconomicParams;
pub use phases::{DATE_FORMAT, DATE_FORMAT_LONG, InstallPhases, PhaseStart};
pub use schema::*;
pub use validate::{ValidationError, validate_project, validate_rotor};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file extension: {path}")]
    UnknownFormat { path: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> ProjectResult<Format> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        _ => Err(ProjectError::UnknownFormat {
            path: path.display().to_string(),
        }),
    }
}

/// Load a rotor file (YAML or JSON by extension) and validate it.
pub fn load_rotor(path: &Path) -> ProjectResult<RotorFile> {
    let content = std::fs::read_to_string(path)?;
    let rotor: RotorFile = match format_of(path)? {
        Format::Yaml => serde_yaml::from_str(&content)?,
        Format::Json => serde_json::from_str(&content)?,
    };
    validate_rotor(&rotor)?;
    Ok(rotor)
}

pub fn save_rotor(path: &Path, rotor: &RotorFile) -> ProjectResult<()> {
    validate_rotor(rotor)?;
    let content = match format_of(path)? {
        Format::Yaml => serde_yaml::to_string(rotor)?,
        Format::Json => serde_json::to_string_pretty(rotor)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a project configuration, resolve the plant capacity and validate.
pub fn load_project(path: &Path) -> ProjectResult<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = match format_of(path)? {
        Format::Yaml => ProjectConfig::from_yaml_str(&content)?,
        Format::Json => ProjectConfig::from_json_str(&content)?,
    };
    let config = resolve_project_capacity(config)?;
    validate_project(&config)?;
    Ok(config)
}

pub fn save_project(path: &Path, config: &ProjectConfig) -> ProjectResult<()> {
    let content = match format_of(path)? {
        Format::Yaml => serde_yaml::to_string(config.as_map())?,
        Format::Json => serde_json::to_string_pretty(config.as_map())?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
