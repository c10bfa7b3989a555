//! Summary files and run reports.

pub mod generator;

pub use generator::{generate_text_summary, write_json_report, write_summary};
