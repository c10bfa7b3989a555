//! Typed failures raised while aggregating result files.
//!
//! Everything here is fatal for the invocation; callers wrap these in
//! `anyhow` with path context and let them propagate to `main`.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::Metric;

#[derive(Debug, Error)]
pub enum AggregateError {
    /// The result file is shorter than the layout expects.
    #[error(
        "{}: expected entry {index} but the record only has {available}",
        .path.display()
    )]
    MissingEntry {
        path: PathBuf,
        index: usize,
        available: usize,
    },

    /// The mean of an empty sample set is undefined.
    #[error("cannot average an empty sample set")]
    EmptySamples,

    #[error("invalid {name} range: start {start} is after end {end}")]
    InvalidRange {
        name: &'static str,
        start: u32,
        end: u32,
    },

    #[error("sweep has no {0} configured")]
    EmptySweep(&'static str),

    #[error("invalid {metric} label pattern: {source}")]
    InvalidLabel {
        metric: Metric,
        #[source]
        source: regex::Error,
    },
}
