//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

use crate::extract::ExtractMode;
use crate::layout::Layout;

/// benchavg - average benchmark results across repeated runs
///
/// Reads the result files an experiment sweep left behind, averages
/// throughput and latency over the repeated runs, and writes one summary
/// file per group next to the inputs.
///
/// Examples:
///   benchavg ./results
///   benchavg ./results --layout per-session
///   benchavg ./results --extract labeled --report run.json
///   benchavg ./results --dry-run
///   benchavg --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Root of the result tree
    ///
    /// Defaults to `general.base_dir` from the config file, then to the
    /// current directory.
    #[arg(value_name = "BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Directory layout of the result tree
    #[arg(long, value_name = "LAYOUT", env = "BENCHAVG_LAYOUT")]
    pub layout: Option<Layout>,

    /// How numbers are read from each result line
    ///
    /// `legacy` keeps every digit on the line; `labeled` captures the
    /// integer after "Throughput"/"Latency".
    #[arg(long, value_name = "MODE", env = "BENCHAVG_EXTRACT")]
    pub extract: Option<ExtractMode>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .benchavg.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write a JSON report of every summary to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// List the files that would be read and written, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .benchavg.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref base_dir) = self.base_dir {
            if !base_dir.exists() {
                return Err(format!(
                    "Base directory does not exist: {}",
                    base_dir.display()
                ));
            }
            if !base_dir.is_dir() {
                return Err(format!(
                    "Base path is not a directory: {}",
                    base_dir.display()
                ));
            }
        }

        if let Some(ref report) = self.report {
            if report.is_dir() {
                return Err(format!("Report path is a directory: {}", report.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
