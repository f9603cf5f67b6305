//! Phase logs.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Action,
}

/// Completion markers used to work out when strings can be energized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProgressTag {
    Substructure,
    Turbine,
    #[serde(rename = "Array String")]
    ArrayString,
    #[serde(rename = "Export System")]
    ExportSystem,
    #[serde(rename = "Offshore Substation")]
    OffshoreSubstation,
}

impl ProgressTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressTag::Substructure => "Substructure",
            ProgressTag::Turbine => "Turbine",
            ProgressTag::ArrayString => "Array String",
            ProgressTag::ExportSystem => "Export System",
            ProgressTag::OffshoreSubstation => "Offshore Substation",
        }
    }
}

impl fmt::Display for ProgressTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log line. `time` is hours at the end of the logged action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: f64,
    pub level: LogLevel,
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressTag>,
}

/// Append-only log of one phase run, in phase-local hours.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseLog {
    entries: Vec<LogEntry>,
}

impl PhaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries moved by `dt` hours, for merging into a project timeline.
    pub fn shifted(&self, dt: f64) -> Vec<LogEntry> {
        self.entries
            .iter()
            .cloned()
            .map(|mut e| {
                e.time += dt;
                e
            })
            .collect()
    }

    pub fn total_cost(&self) -> f64 {
        self.entries.iter().filter_map(|e| e.cost).sum()
    }

    pub fn end_time(&self) -> f64 {
        self.entries.iter().map(|e| e.time).fold(0.0, f64::max)
    }

    pub fn count(&self, level: LogLevel, action: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.level == level && e.action == action)
            .count()
    }
}
