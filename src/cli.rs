//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and merging over the config file.

use chrono::{DateTime, Utc};
use clap::Parser;
use flowatlas::config::Config;
pub use flowatlas::config::OutputFormat;
use flowatlas::models::Severity;
use std::path::PathBuf;

/// flowatlas - analytics for your automation inventory
///
/// Finds duplicate, orphaned and misbehaving automation flows exported
/// from Zapier, Make, HubSpot or Lemlist, and estimates their ROI.
///
/// Examples:
///   flowatlas --input flows.json
///   flowatlas --input exports/ --format json --output atlas.json
///   flowatlas --input flows.json --department sales --fail-on high
///   flowatlas --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Flow export to analyze
    ///
    /// A JSON file holding an array of flows, or a directory of such files.
    #[arg(short, long, value_name = "PATH", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the `general.output` config value, or
    /// `flowatlas_report.<md|json>` when that is unset.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    ///
    /// Defaults to the `general.format` config value.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .flowatlas.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "FLOWATLAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Evaluation time for the staleness rule (RFC 3339)
    ///
    /// Defaults to the current time.
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_timestamp)]
    pub now: Option<DateTime<Utc>>,

    /// Restrict the analysis to one department
    #[arg(short, long, value_name = "NAME")]
    pub department: Option<String>,

    /// Override the duplicate score threshold (0.0 - 1.0)
    #[arg(long, value_name = "SCORE")]
    pub duplicate_threshold: Option<f64>,

    /// Override the staleness window in days
    #[arg(long, value_name = "DAYS")]
    pub stale_days: Option<i64>,

    /// Fail if findings at or above this severity are found
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is exceeded.
    /// Values: high, medium, low
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .flowatlas.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Severity level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
}

impl From<FailOnLevel> for Severity {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Low => Severity::Low,
            FailOnLevel::Medium => Severity::Medium,
            FailOnLevel::High => Severity::High,
        }
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", s, e))
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

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input path does not exist: {}", input.display()));
            }
        }

        if let Some(threshold) = self.duplicate_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err("Duplicate threshold must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(days) = self.stale_days {
            if days < 0 {
                return Err("Stale days must not be negative".to_string());
            }
        }

        if let Some(ref department) = self.department {
            if department.trim().is_empty() {
                return Err("Department must not be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Apply CLI overrides on top of a loaded configuration.
    ///
    /// Only values given explicitly on the command line take precedence.
    pub fn merge_into(&self, config: &mut Config) {
        if let Some(threshold) = self.duplicate_threshold {
            config.duplicates.threshold = threshold;
        }
        if let Some(days) = self.stale_days {
            config.orphans.stale_days = days;
        }
        if let Some(ref output) = self.output {
            config.general.output = Some(output.display().to_string());
        }
        if let Some(format) = self.format {
            config.general.format = format;
        }
        if self.verbose {
            config.general.verbose = true;
        }
    }

    /// Returns the log level from the flags and the config's `general.verbose`.
    ///
    /// `--quiet` wins over a verbose config.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
