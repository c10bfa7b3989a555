//! Pulling numbers out of result records.
//!
//! The harness writes human-readable lines such as
//! `Throughput: 1234 ops/s`. Two strategies are available: the legacy
//! one keeps every digit on the line, the labeled one captures the
//! integer that follows a given label.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::config::ExtractConfig;
use crate::error::AggregateError;
use crate::models::Metric;

/// How a record entry is turned into a number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    /// Concatenate every decimal digit on the entry.
    #[default]
    Legacy,
    /// Capture the integer following the metric's label.
    Labeled,
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractMode::Legacy => write!(f, "legacy"),
            ExtractMode::Labeled => write!(f, "labeled"),
        }
    }
}

/// Keep only the ASCII digits `0`-`9` of `line`, in order.
///
/// Digits from separate numbers are concatenated:
/// `"latency=12 ms, p99=34"` yields `"1234"`.
pub fn extract_digits(line: &str) -> String {
    line.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True when `s` is non-empty and made only of decimal digits.
pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Per-metric extraction rule.
#[derive(Debug, Clone)]
struct FieldRule {
    index: usize,
    pattern: Option<Regex>,
}

impl FieldRule {
    fn new(
        mode: ExtractMode,
        metric: Metric,
        index: usize,
        label: &str,
    ) -> Result<Self, AggregateError> {
        let pattern = match mode {
            ExtractMode::Legacy => None,
            ExtractMode::Labeled => Some(
                label_pattern(label)
                    .map_err(|source| AggregateError::InvalidLabel { metric, source })?,
            ),
        };
        Ok(Self { index, pattern })
    }
}

/// Turns record entries into samples according to [`ExtractConfig`].
#[derive(Debug, Clone)]
pub struct Extractor {
    mode: ExtractMode,
    throughput: FieldRule,
    latency: FieldRule,
}

impl Extractor {
    pub fn new(config: &ExtractConfig) -> Result<Self, AggregateError> {
        Ok(Self {
            mode: config.mode,
            throughput: FieldRule::new(
                config.mode,
                Metric::Throughput,
                config.throughput_index,
                &config.throughput_label,
            )?,
            latency: FieldRule::new(
                config.mode,
                Metric::Latency,
                config.latency_index,
                &config.latency_label,
            )?,
        })
    }

    pub fn mode(&self) -> ExtractMode {
        self.mode
    }

    /// Record entry that holds `metric`.
    pub fn index(&self, metric: Metric) -> usize {
        self.rule(metric).index
    }

    /// Parse `metric` out of an entry. `None` means the value is dropped.
    pub fn parse(&self, metric: Metric, entry: &str) -> Option<u64> {
        let digits = match self.rule(metric).pattern {
            None => extract_digits(entry),
            Some(ref re) => re
                .captures(entry)
                .and_then(|cap| cap.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        };

        if !is_numeric(&digits) {
            debug!("Dropping non-numeric {} entry: {:?}", metric, entry);
            return None;
        }

        match digits.parse::<u64>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Dropping {} value {}: {}", metric, digits, e);
                None
            }
        }
    }

    fn rule(&self, metric: Metric) -> &FieldRule {
        match metric {
            Metric::Throughput => &self.throughput,
            Metric::Latency => &self.latency,
        }
    }
}

/// `Throughput: 100`, `throughput=100`, and `Throughput 100` all match.
///
/// Only ASCII digits are captured, the same set [`extract_digits`] keeps.
fn label_pattern(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i){}\s*[:=]?\s*([0-9]+)", regex::escape(label)))
}
