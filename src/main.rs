//! flowatlas - automation inventory analytics
//!
//! A CLI tool that loads automation flows exported from third-party
//! platforms, flags duplicates, orphans and performance anomalies, and
//! estimates the ROI of every flow.
//!
//! Exit codes:
//!   0 - Success (no findings above threshold, or no --fail-on set)
//!   1 - Runtime error (unreadable input, invalid config or data, etc.)
//!   2 - Findings found at or above --fail-on threshold

mod cli;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use flowatlas::analysis::{self, generate_summary_text, summarize_anomalies, summarize_orphans};
use flowatlas::config::{Config, CONFIG_FILE_NAME};
use flowatlas::loader;
use flowatlas::models::Department;
use flowatlas::report::{self, ReportMetadata};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

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

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("flowatlas v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .flowatlas.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to tune duplicate, orphan, anomaly and ROI thresholds.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the configuration file and apply command-line overrides.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args)?;
    args.merge_into(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Run the complete analysis workflow. Returns exit code (0 or 2).
fn run(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    // Required unless --init-config, which returned earlier
    let input = args
        .input
        .clone()
        .context("--input is required")?;

    if !args.quiet {
        println!("📥 Loading flows from: {}", input.display());
    }
    let mut flows = loader::load_flows(&input)?;

    let department = args.department.as_deref().map(Department::from);
    if let Some(ref department) = department {
        flows = loader::filter_department(flows, department);
        info!("Restricted to department {}: {} flows", department, flows.len());
    }

    if flows.is_empty() {
        warn!("No flows to analyze");
    }

    let now = args.now.unwrap_or_else(Utc::now);
    if !args.quiet {
        println!("🔬 Analyzing {} flows...", flows.len());
    }
    let analytics = analysis::analyze(&flows, now, config);

    let metadata = ReportMetadata {
        source: input.display().to_string(),
        generated_at: Utc::now(),
        flows_analyzed: flows.len(),
        department_filter: department.map(|d| d.to_string()),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&analytics, &metadata)?,
        OutputFormat::Markdown => report::generate_markdown_report(&analytics, &metadata),
    };

    let output_path = config.general.output_path();
    report::write_report(&output, &output_path)?;

    if !args.quiet {
        let orphans = summarize_orphans(&analytics.orphans);
        let anomalies = summarize_anomalies(&analytics.anomalies);

        println!("\n📊 Analysis Summary:");
        println!(
            "   Flows: {} ({} active)",
            analytics.metrics.total_flows, analytics.metrics.active_flows
        );
        println!("   Duplicate groups: {}", analytics.duplicates.len());
        for (title, summary) in [("Orphans", &orphans), ("Anomalies", &anomalies)] {
            for line in generate_summary_text(title, summary).lines() {
                println!("   {}", line);
            }
        }
        println!(
            "   Estimated monthly savings: ${:.2}",
            analytics.total_monthly_savings
        );
        println!(
            "\n✅ Analysis complete! Report saved to: {}",
            output_path.display()
        );
    }

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        if analytics.has_findings_at_or_above(fail_level.into()) {
            eprintln!(
                "\n⛔ Findings at or above {:?} severity. Failing (exit code 2).",
                fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture_path() -> String {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures/flows.json")
            .display()
            .to_string()
    }

    /// Quiet run over the fixture export with an explicit config file.
    fn fixture_args(temp_dir: &TempDir, config_toml: &str, extra: &[&str]) -> Args {
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, config_toml).unwrap();

        let mut argv = vec![
            "flowatlas".to_string(),
            "--input".to_string(),
            fixture_path(),
            "--config".to_string(),
            config_path.display().to_string(),
            "--now".to_string(),
            "2025-07-21T08:30:00Z".to_string(),
            "--quiet".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_run_fails_on_high_findings() {
        let temp_dir = TempDir::new().unwrap();
        let report_path = temp_dir.path().join("atlas.md");
        let output = report_path.display().to_string();
        let args = fixture_args(&temp_dir, "", &["--output", &output, "--fail-on", "high"]);

        let config = resolve_config(&args).unwrap();
        assert_eq!(run(&args, &config).unwrap(), 2);

        let markdown = std::fs::read_to_string(&report_path).unwrap();
        assert!(markdown.contains("## Orphaned Flows"));
    }

    #[test]
    fn test_run_without_fail_on_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let report_path = temp_dir.path().join("atlas.json");
        let output = report_path.display().to_string();
        let args = fixture_args(&temp_dir, "", &["--output", &output, "--format", "json"]);

        let config = resolve_config(&args).unwrap();
        assert_eq!(run(&args, &config).unwrap(), 0);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["metrics"]["total_flows"], 8);
    }

    #[test]
    fn test_config_file_format_and_verbosity() {
        let temp_dir = TempDir::new().unwrap();
        let args = fixture_args(&temp_dir, "[general]\nformat = \"json\"\nverbose = true\n", &[]);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.general.output_path(), PathBuf::from("flowatlas_report.json"));
        // --quiet from the command line still wins
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::ERROR);
    }

    #[test]
    fn test_config_file_weights_reach_analysis() {
        let temp_dir = TempDir::new().unwrap();
        let args = fixture_args(
            &temp_dir,
            "[duplicates]\nname_weight = 0.0\ntrigger_weight = 0.5\naction_weight = 0.5\n",
            &[],
        );

        let config = resolve_config(&args).unwrap();
        let flows = loader::load_flows(Path::new(&fixture_path())).unwrap();
        let now = args.now.unwrap();
        let report = analysis::analyze(&flows, now, &config);

        // Names no longer count: shared trigger and half the actions put f5 with f1 and f2
        let groups: Vec<(&str, Vec<&str>)> = report
            .duplicates
            .iter()
            .map(|g| {
                let ids = g.duplicates.iter().map(|d| d.flow.id.as_str()).collect();
                (g.flow.id.as_str(), ids)
            })
            .collect();
        assert_eq!(
            groups,
            vec![("f1", vec!["f2", "f5"]), ("f2", vec!["f5"])]
        );
    }

    #[test]
    fn test_invalid_config_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let args = fixture_args(&temp_dir, "[duplicates]\nthreshold = 2.0\n", &[]);

        assert!(resolve_config(&args).is_err());
    }
}
