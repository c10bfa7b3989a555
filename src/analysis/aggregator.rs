//! Sample collection and averaging.
//!
//! This module walks the sweep, reads every result file of a group,
//! and reduces the pooled samples to integer means.

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{Config, SweepConfig};
use crate::error::AggregateError;
use crate::extract::Extractor;
use crate::layout::Layout;
use crate::models::{GroupKey, GroupSummary, Metric, RunMetadata, RunReport, SampleSet};
use crate::report::write_summary;

/// Arithmetic mean truncated toward zero.
///
/// The mean of an empty set is undefined and reported as an error.
pub fn summarize(samples: &[u64]) -> Result<u64, AggregateError> {
    if samples.is_empty() {
        return Err(AggregateError::EmptySamples);
    }
    let total: u128 = samples.iter().map(|&v| u128::from(v)).sum();
    Ok((total / samples.len() as u128) as u64)
}

/// Inputs and output of one group, for `--dry-run`.
#[derive(Debug, Clone)]
pub struct PlannedGroup {
    pub group: GroupKey,
    pub output_path: PathBuf,
    /// Each input path and whether it currently exists.
    pub inputs: Vec<(PathBuf, bool)>,
}

/// Averages a result tree into per-group summary files.
pub struct Aggregator {
    base_dir: PathBuf,
    sweep: SweepConfig,
    layout: Layout,
    extractor: Extractor,
}

impl Aggregator {
    /// Create an aggregator rooted at `base_dir`.
    pub fn new(base_dir: PathBuf, config: &Config) -> Result<Self> {
        config.sweep.validate().context("Invalid sweep configuration")?;
        let extractor =
            Extractor::new(&config.extract).context("Invalid extract configuration")?;

        Ok(Self {
            base_dir,
            sweep: config.sweep.clone(),
            layout: config.layout.kind,
            extractor,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Summary groups in write order.
    pub fn groups(&self) -> Vec<GroupKey> {
        self.layout.groups(&self.sweep)
    }

    /// Read every member file of `group` and pool its samples.
    ///
    /// A missing file or a record too short to hold both entries aborts
    /// the collection. Entries without a usable number are dropped.
    pub fn collect_samples(&self, group: &GroupKey) -> Result<SampleSet> {
        let mut samples = SampleSet::default();

        for coord in self.layout.members(&self.sweep, group) {
            let path = self.layout.input_path(&self.base_dir, &coord);
            self.read_record(&path, &mut samples)?;
        }

        debug!(
            "{}: {} throughput / {} latency samples, {} dropped",
            group,
            samples.throughput.len(),
            samples.latency.len(),
            samples.dropped
        );
        Ok(samples)
    }

    fn read_record(&self, path: &Path, samples: &mut SampleSet) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read result file: {}", path.display()))?;
        samples.files_read += 1;

        let entries = self.layout.record_shape().entries(&content);

        for metric in [Metric::Throughput, Metric::Latency] {
            let index = self.extractor.index(metric);
            let entry = entries.get(index).ok_or_else(|| AggregateError::MissingEntry {
                path: path.to_path_buf(),
                index,
                available: entries.len(),
            })?;
            samples.push(metric, self.extractor.parse(metric, entry));
        }

        Ok(())
    }

    /// Collect and average one group without writing anything.
    pub fn summarize_group(&self, group: &GroupKey) -> Result<GroupSummary> {
        let samples = self.collect_samples(group)?;

        let mean = |metric: Metric| {
            summarize(samples.samples(metric))
                .with_context(|| format!("No usable {} samples for {}", metric, group))
        };

        Ok(GroupSummary {
            group: group.clone(),
            output_path: self.layout.output_path(&self.base_dir, group),
            throughput: mean(Metric::Throughput)?,
            latency: mean(Metric::Latency)?,
            throughput_samples: samples.throughput.len(),
            latency_samples: samples.latency.len(),
            dropped_samples: samples.dropped,
            files_read: samples.files_read,
        })
    }

    /// Aggregate the whole sweep, writing one summary file per group.
    pub fn run(&self, progress: &ProgressBar) -> Result<RunReport> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let groups = self.groups();

        info!(
            "Aggregating {} groups under {} ({} layout, {} extraction)",
            groups.len(),
            self.base_dir.display(),
            self.layout,
            self.extractor.mode()
        );
        progress.set_length(groups.len() as u64);

        let mut summaries = Vec::with_capacity(groups.len());
        let mut files_read = 0;

        for group in &groups {
            progress.set_message(group.to_string());

            let summary = self.summarize_group(group)?;
            write_summary(&summary.output_path, summary.throughput, summary.latency)?;
            debug!(
                "Wrote {} (throughput {}, latency {})",
                summary.output_path.display(),
                summary.throughput,
                summary.latency
            );

            files_read += summary.files_read;
            summaries.push(summary);
            progress.inc(1);
        }

        progress.finish_and_clear();

        let samples_dropped = summaries.iter().map(|s| s.dropped_samples).sum();
        Ok(RunReport {
            metadata: RunMetadata {
                base_dir: self.base_dir.clone(),
                layout: self.layout.to_string(),
                extract_mode: self.extractor.mode().to_string(),
                started_at,
                files_read,
                samples_dropped,
                duration_seconds: start_time.elapsed().as_secs_f64(),
            },
            groups: summaries,
        })
    }

    /// Describe what [`Aggregator::run`] would touch, without reading files.
    pub fn plan(&self) -> Vec<PlannedGroup> {
        self.groups()
            .into_iter()
            .map(|group| {
                let inputs = self
                    .layout
                    .members(&self.sweep, &group)
                    .iter()
                    .map(|coord| {
                        let path = self.layout.input_path(&self.base_dir, coord);
                        let exists = path.is_file();
                        (path, exists)
                    })
                    .collect();
                PlannedGroup {
                    output_path: self.layout.output_path(&self.base_dir, &group),
                    group,
                    inputs,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexRange;
    use crate::extract::ExtractMode;
    use tempfile::TempDir;

    fn result_file(throughput: &str, latency: &str) -> String {
        format!(
            "Benchmark complete\nclients: 4\nservers: 3\nduration: 60s\n{}\n{}\n",
            throughput, latency
        )
    }

    fn single_group_config(layout: Layout) -> Config {
        let mut config = Config::default();
        config.sweep = SweepConfig {
            configurations: vec!["GossipRandom".to_string()],
            workloads: vec!["50".to_string()],
            sessions: IndexRange::new(0, 0),
            items: IndexRange::new(1, 1),
            runs: IndexRange::new(1, 3),
        };
        config.layout.kind = layout;
        config
    }

    fn write_runs<S: AsRef<str>>(base: &Path, contents: [S; 3]) {
        for (run, content) in (1..=3).zip(contents) {
            let dir = base.join(format!("GossipRandom/workload_50/0/run_{}", run));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("1"), content.as_ref()).unwrap();
        }
    }

    #[test]
    fn test_summarize_truncates() {
        assert_eq!(summarize(&[10, 20, 21]).unwrap(), 17);
        assert_eq!(summarize(&[10, 10, 11]).unwrap(), 10);
        assert_eq!(summarize(&[u64::MAX, u64::MAX]).unwrap(), u64::MAX);
    }

    #[test]
    fn test_summarize_empty_fails() {
        assert!(matches!(summarize(&[]), Err(AggregateError::EmptySamples)));
    }

    #[test]
    fn test_end_to_end_per_item() {
        let temp_dir = TempDir::new().unwrap();
        let content = result_file("Throughput: 100 reqs", "Latency: 20 ms");
        write_runs(temp_dir.path(), [&content, &content, &content]);

        let config = single_group_config(Layout::PerItem);
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let report = aggregator.run(&ProgressBar::hidden()).unwrap();

        let written =
            fs::read_to_string(temp_dir.path().join("GossipRandom/workload_50/0/1")).unwrap();
        assert_eq!(written, "Throughput: 100\nLatency: 20");
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.metadata.files_read, 3);
        assert_eq!(report.metadata.samples_dropped, 0);
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let content = "a\rb\rc\rd\rThroughput: 100 reqs\rLatency: 20 ms\r";
        let temp_dir = TempDir::new().unwrap();
        write_runs(temp_dir.path(), [content, content, content]);

        let config = single_group_config(Layout::PerItem);
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let report = aggregator.run(&ProgressBar::hidden()).unwrap();

        assert_eq!(report.groups[0].throughput, 100);
        assert_eq!(report.groups[0].latency, 20);
        let written =
            fs::read_to_string(temp_dir.path().join("GossipRandom/workload_50/0/1")).unwrap();
        assert_eq!(written, "Throughput: 100\nLatency: 20");
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        write_runs(
            temp_dir.path(),
            [
                &result_file("Throughput: 101", "Latency: 7"),
                &result_file("Throughput: 250", "Latency: 9"),
                &result_file("Throughput: 99", "Latency: 12"),
            ],
        );

        let config = single_group_config(Layout::PerItem);
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let output = temp_dir.path().join("GossipRandom/workload_50/0/1");

        aggregator.run(&ProgressBar::hidden()).unwrap();
        let first = fs::read(&output).unwrap();
        aggregator.run(&ProgressBar::hidden()).unwrap();
        let second = fs::read(&output).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, b"Throughput: 150\nLatency: 9");
    }

    #[test]
    fn test_non_numeric_entry_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        write_runs(
            temp_dir.path(),
            [
                &result_file("Throughput: 10", "Latency: 4"),
                &result_file("Throughput: n/a", "Latency: 5"),
                &result_file("Throughput: 21", "Latency: 6"),
            ],
        );

        let config = single_group_config(Layout::PerItem);
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let groups = aggregator.groups();
        let group = &groups[0];
        let summary = aggregator.summarize_group(group).unwrap();

        // (10 + 21) / 2, not (10 + 0 + 21) / 3
        assert_eq!(summary.throughput, 15);
        assert_eq!(summary.throughput_samples, 2);
        assert_eq!(summary.latency, 5);
        assert_eq!(summary.dropped_samples, 1);
    }

    #[test]
    fn test_all_entries_dropped_fails() {
        let temp_dir = TempDir::new().unwrap();
        let content = result_file("Throughput: n/a", "Latency: 5");
        write_runs(temp_dir.path(), [&content, &content, &content]);

        let config = single_group_config(Layout::PerItem);
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let err = aggregator.run(&ProgressBar::hidden()).unwrap_err();

        assert!(err.to_string().contains("No usable throughput samples"));
        assert!(!temp_dir.path().join("GossipRandom/workload_50/0/1").exists());
    }

    #[test]
    fn test_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = single_group_config(Layout::PerItem);
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();

        let err = aggregator.run(&ProgressBar::hidden()).unwrap_err();
        assert!(format!("{:#}", err).contains("run_1"));
    }

    #[test]
    fn test_short_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        write_runs(temp_dir.path(), ["only\nfour\nlines\nhere", "", ""]);

        let config = single_group_config(Layout::PerItem);
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let groups = aggregator.groups();
        let group = &groups[0];
        let err = aggregator.collect_samples(group).unwrap_err();

        match err.downcast_ref::<AggregateError>() {
            Some(AggregateError::MissingEntry {
                index, available, ..
            }) => {
                assert_eq!(*index, 4);
                assert_eq!(*available, 4);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_per_session_pools_runs_and_items() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = single_group_config(Layout::PerSession);
        config.sweep.items = IndexRange::new(1, 2);

        let mut throughput = 10;
        for run in 1..=3 {
            let dir = temp_dir
                .path()
                .join(format!("output/GossipRandom/workload_50/0/0/run_{}", run));
            fs::create_dir_all(&dir).unwrap();
            for item in 1..=2 {
                let content = format!(
                    "t0 t1 t2 t3 {}ops {}ms extra\nignored 1 2 3 4 5",
                    throughput, item
                );
                fs::write(dir.join(item.to_string()), content).unwrap();
                throughput += 10;
            }
        }

        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let report = aggregator.run(&ProgressBar::hidden()).unwrap();

        // throughput 10..=60 -> 35, latency alternating 1 and 2 -> 1
        let summary = &report.groups[0];
        assert_eq!(summary.throughput, 35);
        assert_eq!(summary.latency, 1);
        assert_eq!(report.metadata.files_read, 6);

        // the summary directory is created on demand
        let written = fs::read_to_string(
            temp_dir
                .path()
                .join("output/GossipRandom/workload_50/0/summary"),
        )
        .unwrap();
        assert_eq!(written, "Throughput: 35\nLatency: 1");
    }

    #[test]
    fn test_labeled_mode_ignores_other_numbers() {
        let temp_dir = TempDir::new().unwrap();
        let content = result_file("Throughput: 100 reqs over 60s", "p99=34 Latency: 20 ms");
        write_runs(temp_dir.path(), [&content, &content, &content]);

        let mut config = single_group_config(Layout::PerItem);
        config.extract.mode = ExtractMode::Labeled;
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let summary = aggregator.summarize_group(&aggregator.groups()[0]).unwrap();

        assert_eq!(summary.throughput, 100);
        assert_eq!(summary.latency, 20);
    }

    #[test]
    fn test_plan_reports_missing_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let content = result_file("Throughput: 1", "Latency: 1");
        write_runs(temp_dir.path(), [&content, &content, &content]);
        fs::remove_file(temp_dir.path().join("GossipRandom/workload_50/0/run_2/1")).unwrap();

        let config = single_group_config(Layout::PerItem);
        let aggregator = Aggregator::new(temp_dir.path().to_path_buf(), &config).unwrap();
        let plan = aggregator.plan();

        assert_eq!(plan.len(), 1);
        let present: Vec<bool> = plan[0].inputs.iter().map(|(_, exists)| *exists).collect();
        assert_eq!(present, vec![true, false, true]);
        assert!(!plan[0].output_path.exists());
    }

    #[test]
    fn test_invalid_sweep_is_rejected() {
        let mut config = Config::default();
        config.sweep.configurations.clear();
        assert!(Aggregator::new(PathBuf::from("."), &config).is_err());
    }
}
