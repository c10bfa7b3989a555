//! Summary file and run report generation.
//!
//! Summary files use the fixed two-line format downstream plotting
//! scripts read. The JSON run report and the console summary describe
//! the invocation as a whole.

use crate::models::{Metric, RunReport};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Render a summary file body. There is no trailing newline.
pub fn format_summary(throughput: u64, latency: u64) -> String {
    format!(
        "{}: {}\n{}: {}",
        Metric::Throughput.label(),
        throughput,
        Metric::Latency.label(),
        latency
    )
}

/// Create or overwrite the summary file at `path`.
pub fn write_summary(path: &Path, throughput: u64, latency: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    fs::write(path, format_summary(throughput, latency))
        .with_context(|| format!("Failed to write summary to {}", path.display()))
}

/// Generate a JSON run report.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON run report to a file.
pub fn write_json_report(report: &RunReport, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Short human-readable recap of a run.
pub fn generate_text_summary(report: &RunReport) -> String {
    let mut lines = Vec::new();
    let meta = &report.metadata;

    lines.push(format!("Base directory: {}", meta.base_dir.display()));
    lines.push(format!(
        "Layout: {} | Extraction: {}",
        meta.layout, meta.extract_mode
    ));
    lines.push(format!("Summaries written: {}", report.groups.len()));
    lines.push(format!("Result files read: {}", meta.files_read));
    if meta.samples_dropped > 0 {
        lines.push(format!("Non-numeric values dropped: {}", meta.samples_dropped));
    }
    lines.push(format!("Duration: {:.1}s", meta.duration_seconds));

    lines.join("\n")
}
