//! benchavg - benchmark result aggregator
//!
//! A CLI tool that walks the result tree of a distributed-systems
//! benchmark sweep, averages throughput and latency across repeated
//! runs, and writes one summary file per group.
//!
//! Exit codes:
//!   0 - Success (including --dry-run and --init-config)
//!   1 - Any error (unreadable or short result file, empty sample set,
//!       bad configuration or arguments)

mod analysis;
mod cli;
mod config;
mod error;
mod extract;
mod layout;
mod models;
mod report;

use analysis::Aggregator;
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args)?;

    info!("benchavg v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Aggregation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .benchavg.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change the sweep, layout, and extraction rules.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins when set.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the aggregation workflow.
fn run(args: Args) -> Result<()> {
    let mut config = Config::resolve(
        args.config.as_deref(),
        std::path::Path::new(DEFAULT_CONFIG_FILE),
    )?;
    config.merge_with_args(&args);

    let base_dir = config.base_dir()?;
    let aggregator = Aggregator::new(base_dir, &config)?;

    if args.dry_run {
        return handle_dry_run(&aggregator);
    }

    let progress = make_progress_bar(args.quiet)?;
    let report = aggregator.run(&progress)?;

    if let Some(ref path) = config.general.report {
        report::write_json_report(&report, path)?;
        info!("Run report saved to {}", path.display());
    }

    if !args.quiet {
        println!("\n📊 Aggregation Summary:");
        for line in report::generate_text_summary(&report).lines() {
            println!("   {}", line);
        }
        println!("\n✅ Done.");
    }

    Ok(())
}

/// Handle --dry-run: list inputs and outputs, read and write nothing.
fn handle_dry_run(aggregator: &Aggregator) -> Result<()> {
    println!(
        "\n🔍 Dry run: {} (nothing is read or written)\n",
        aggregator.base_dir().display()
    );

    let plan = aggregator.plan();
    let mut missing = 0;

    for planned in &plan {
        println!("   📄 {} -> {}", planned.group, planned.output_path.display());
        for (path, exists) in &planned.inputs {
            if *exists {
                debug!("      {}", path.display());
            } else {
                missing += 1;
                println!("      ⚠️  missing {}", path.display());
            }
        }
    }

    let inputs: usize = plan.iter().map(|p| p.inputs.len()).sum();
    println!(
        "\n   Total: {} summaries from {} result files ({} missing)",
        plan.len(),
        inputs,
        missing
    );
    if missing > 0 {
        warn!("{} result files are missing; a real run would fail", missing);
    }

    println!("\n✅ Dry run complete.");
    Ok(())
}

fn make_progress_bar(quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
