//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.benchavg.toml` files. The defaults reproduce the sweep the
//! experiment harness produces, so a missing file is never an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::AggregateError;
use crate::extract::ExtractMode;
use crate::layout::Layout;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".benchavg.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Which result files exist.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// How coordinates map to paths.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// How numbers are pulled out of each record.
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Root of the result tree. Falls back to the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    /// Write a JSON run report here after aggregating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

/// Inclusive integer range, e.g. `{ start = 1, end = 10 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: u32,
    pub end: u32,
}

impl IndexRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }

    fn validate(&self, name: &'static str) -> Result<(), AggregateError> {
        if self.start > self.end {
            return Err(AggregateError::InvalidRange {
                name,
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// The combinatorial space of result files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Replication strategies under test.
    #[serde(default = "default_configurations")]
    pub configurations: Vec<String>,

    /// Load profiles.
    #[serde(default = "default_workloads")]
    pub workloads: Vec<String>,

    #[serde(default = "default_sessions")]
    pub sessions: IndexRange,

    #[serde(default = "default_items")]
    pub items: IndexRange,

    #[serde(default = "default_runs")]
    pub runs: IndexRange,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            configurations: default_configurations(),
            workloads: default_workloads(),
            sessions: default_sessions(),
            items: default_items(),
            runs: default_runs(),
        }
    }
}

impl SweepConfig {
    /// Reject sweeps that would read nothing or iterate backwards.
    pub fn validate(&self) -> Result<(), AggregateError> {
        if self.configurations.is_empty() {
            return Err(AggregateError::EmptySweep("configurations"));
        }
        if self.workloads.is_empty() {
            return Err(AggregateError::EmptySweep("workloads"));
        }
        self.sessions.validate("sessions")?;
        self.items.validate("items")?;
        self.runs.validate("runs")?;
        Ok(())
    }
}

fn default_configurations() -> Vec<String> {
    vec![
        "GossipRandom",
        "PinnedRoundRobin",
        "PrimaryBackUpRandom",
        "PrimaryBackUpRoundRobin",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_workloads() -> Vec<String> {
    vec!["50".to_string()]
}

fn default_sessions() -> IndexRange {
    IndexRange::new(0, 5)
}

fn default_items() -> IndexRange {
    IndexRange::new(1, 10)
}

fn default_runs() -> IndexRange {
    IndexRange::new(1, 3)
}

/// Layout settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub kind: Layout,
}

/// Extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub mode: ExtractMode,

    /// Zero-based record entry holding throughput.
    #[serde(default = "default_throughput_index")]
    pub throughput_index: usize,

    /// Zero-based record entry holding latency.
    #[serde(default = "default_latency_index")]
    pub latency_index: usize,

    /// Label searched for in `labeled` mode.
    #[serde(default = "default_throughput_label")]
    pub throughput_label: String,

    #[serde(default = "default_latency_label")]
    pub latency_label: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            mode: ExtractMode::default(),
            throughput_index: default_throughput_index(),
            latency_index: default_latency_index(),
            throughput_label: default_throughput_label(),
            latency_label: default_latency_label(),
        }
    }
}

fn default_throughput_index() -> usize {
    4
}

fn default_latency_index() -> usize {
    5
}

fn default_throughput_label() -> String {
    "Throughput".to_string()
}

fn default_latency_label() -> String {
    "Latency".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from `path` if the file is there.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Pick the configuration for a run.
    ///
    /// An explicit path must load. Otherwise `default_path` is tried, and a
    /// broken default file only costs a warning.
    pub fn resolve(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config from: {}", path.display());
            return Self::load(path);
        }

        match Self::load_if_exists(default_path) {
            Ok(Some(config)) => {
                info!("Loaded default config from {}", default_path.display());
                Ok(config)
            }
            Ok(None) => {
                debug!("No config file found, using defaults");
                Ok(Config::default())
            }
            Err(e) => {
                warn!("Failed to load config: {:#}", e);
                Ok(Config::default())
            }
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_dir) = args.base_dir {
            self.general.base_dir = Some(base_dir.clone());
        }
        if let Some(ref report) = args.report {
            self.general.report = Some(report.clone());
        }
        if let Some(layout) = args.layout {
            self.layout.kind = layout;
        }
        if let Some(mode) = args.extract {
            self.extract.mode = mode;
        }
    }

    /// Root of the result tree, defaulting to the working directory.
    pub fn base_dir(&self) -> Result<PathBuf> {
        match self.general.base_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to resolve working directory"),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
