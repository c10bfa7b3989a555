//! Data models for the result aggregator.
//!
//! This module contains the core data structures used throughout
//! the application for addressing result files, pooling samples,
//! and describing what a run produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A measured quantity pulled out of each result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Throughput,
    Latency,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Throughput => write!(f, "throughput"),
            Metric::Latency => write!(f, "latency"),
        }
    }
}

impl Metric {
    /// Label used in summary files.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Throughput => "Throughput",
            Metric::Latency => "Latency",
        }
    }
}

/// Position of a single result file in the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathCoordinate {
    pub configuration: String,
    pub workload: String,
    pub session: u32,
    pub item: u32,
    pub run: u32,
}

/// Identifies one summary file.
///
/// `item` is set when every item gets its own summary and left empty when
/// all items of a session are pooled together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub configuration: String,
    pub workload: String,
    pub session: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<u32>,
}

impl GroupKey {
    /// Coordinate of `run` (and `item`, for pooled groups) within this group.
    pub fn coordinate(&self, item: u32, run: u32) -> PathCoordinate {
        PathCoordinate {
            configuration: self.configuration.clone(),
            workload: self.workload.clone(),
            session: self.session,
            item,
            run,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/workload_{}/session {}",
            self.configuration, self.workload, self.session
        )?;
        if let Some(item) = self.item {
            write!(f, "/item {}", item)?;
        }
        Ok(())
    }
}

/// Samples pooled for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet {
    pub throughput: Vec<u64>,
    pub latency: Vec<u64>,
    /// Values that failed the numeric guard and were left out.
    pub dropped: usize,
    /// Number of result files read.
    pub files_read: usize,
}

impl SampleSet {
    /// Record one extracted value, or count it as dropped.
    pub fn push(&mut self, metric: Metric, value: Option<u64>) {
        match value {
            Some(v) => self.samples_mut(metric).push(v),
            None => self.dropped += 1,
        }
    }

    pub fn samples(&self, metric: Metric) -> &[u64] {
        match metric {
            Metric::Throughput => &self.throughput,
            Metric::Latency => &self.latency,
        }
    }

    fn samples_mut(&mut self, metric: Metric) -> &mut Vec<u64> {
        match metric {
            Metric::Throughput => &mut self.throughput,
            Metric::Latency => &mut self.latency,
        }
    }
}

/// Averaged values written for one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: GroupKey,
    /// Where the summary file was (or would be) written.
    pub output_path: PathBuf,
    pub throughput: u64,
    pub latency: u64,
    pub throughput_samples: usize,
    pub latency_samples: usize,
    pub dropped_samples: usize,
    pub files_read: usize,
}

/// Metadata about an aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Root of the result tree.
    pub base_dir: PathBuf,
    /// Layout used to address files.
    pub layout: String,
    /// Extraction mode used on each record.
    pub extract_mode: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    pub files_read: usize,
    pub samples_dropped: usize,
    pub duration_seconds: f64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub groups: Vec<GroupSummary>,
}
