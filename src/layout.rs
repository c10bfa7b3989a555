//! Directory layouts produced by the experiment harness.
//!
//! A layout decides three things: where the result file of a coordinate
//! lives, which coordinates are pooled into one summary, and where that
//! summary is written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::SweepConfig;
use crate::models::{GroupKey, PathCoordinate};

/// How a result file is split into entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// One entry per line.
    Lines,
    /// Whitespace-separated tokens of the first line.
    Tokens,
}

impl RecordShape {
    /// Split file content into entries.
    pub fn entries<'a>(&self, content: &'a str) -> Vec<&'a str> {
        match self {
            RecordShape::Lines => split_lines(content),
            RecordShape::Tokens => split_lines(content)
                .into_iter()
                .next()
                .map(|line| line.split_whitespace().collect())
                .unwrap_or_default(),
        }
    }
}

/// Split on `\n`, `\r\n`, and a lone `\r`.
///
/// A terminator at the very end does not produce a trailing empty line.
fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = content;

    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(pos) => {
                lines.push(&rest[..pos]);
                let terminator = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[pos + terminator..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }

    lines
}

/// Path layout of a result tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// `<conf>/workload_<w>/<session>/run_<run>/<item>`, one summary per item.
    #[default]
    PerItem,
    /// `output/<conf>/workload_<w>/<session>/<session>/run_<run>/<item>`,
    /// one summary per session.
    PerSession,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::PerItem => write!(f, "per-item"),
            Layout::PerSession => write!(f, "per-session"),
        }
    }
}

impl Layout {
    pub fn record_shape(&self) -> RecordShape {
        match self {
            Layout::PerItem => RecordShape::Lines,
            Layout::PerSession => RecordShape::Tokens,
        }
    }

    /// All summary groups of the sweep, in write order.
    pub fn groups(&self, sweep: &SweepConfig) -> Vec<GroupKey> {
        let mut groups = Vec::new();

        for configuration in &sweep.configurations {
            for workload in &sweep.workloads {
                for session in sweep.sessions.iter() {
                    let key = |item| GroupKey {
                        configuration: configuration.clone(),
                        workload: workload.clone(),
                        session,
                        item,
                    };
                    match self {
                        Layout::PerItem => {
                            groups.extend(sweep.items.iter().map(|item| key(Some(item))))
                        }
                        Layout::PerSession => groups.push(key(None)),
                    }
                }
            }
        }

        groups
    }

    /// Coordinates whose samples are pooled into `group`, in read order.
    pub fn members(&self, sweep: &SweepConfig, group: &GroupKey) -> Vec<PathCoordinate> {
        match group.item {
            Some(item) => sweep
                .runs
                .iter()
                .map(|run| group.coordinate(item, run))
                .collect(),
            None => sweep
                .runs
                .iter()
                .flat_map(|run| sweep.items.iter().map(move |item| (run, item)))
                .map(|(run, item)| group.coordinate(item, run))
                .collect(),
        }
    }

    /// Result file of one coordinate.
    pub fn input_path(&self, base: &Path, coord: &PathCoordinate) -> PathBuf {
        let session = coord.session.to_string();
        let mut path =
            self.session_dir(base, &coord.configuration, &coord.workload, coord.session);
        if *self == Layout::PerSession {
            path.push(&session);
        }
        path.push(format!("run_{}", coord.run));
        path.push(coord.item.to_string());
        path
    }

    /// Summary file of one group.
    pub fn output_path(&self, base: &Path, group: &GroupKey) -> PathBuf {
        let dir = self.session_dir(base, &group.configuration, &group.workload, group.session);
        match group.item {
            Some(item) => dir.join(item.to_string()),
            None => dir.join("summary"),
        }
    }

    fn session_dir(
        &self,
        base: &Path,
        configuration: &str,
        workload: &str,
        session: u32,
    ) -> PathBuf {
        let root = match self {
            Layout::PerItem => base.to_path_buf(),
            Layout::PerSession => base.join("output"),
        };
        root.join(configuration)
            .join(format!("workload_{}", workload))
            .join(session.to_string())
    }
}
