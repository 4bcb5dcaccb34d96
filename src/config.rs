//! Configuration file handling.
//!
//! This module handles loading and validating the analysis thresholds
//! from `.flowatlas.toml` files. Every field has a default, so an empty
//! file (or no file at all) reproduces the stock heuristics.

use anyhow::{ensure, Context, Result};
use crate::models::Department;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".flowatlas.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Duplicate detector settings.
    #[serde(default)]
    pub duplicates: DuplicateConfig,

    /// Orphan detector settings.
    #[serde(default)]
    pub orphans: OrphanConfig,

    /// Anomaly detector settings.
    #[serde(default)]
    pub anomalies: AnomalyConfig,

    /// ROI and business impact settings.
    #[serde(default)]
    pub roi: RoiConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path. Defaults to `flowatlas_report` with the extension
    /// of `format`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl GeneralConfig {
    /// Path the report is written to.
    pub fn output_path(&self) -> PathBuf {
        match self.output {
            Some(ref output) => PathBuf::from(output),
            None => PathBuf::from(format!("{}.{}", DEFAULT_REPORT_STEM, self.format.extension())),
        }
    }
}

/// File stem of the report when no output path is configured.
const DEFAULT_REPORT_STEM: &str = "flowatlas_report";

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

/// Duplicate detector weights and threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// Weight of the name similarity in the composite score.
    #[serde(default = "default_name_weight")]
    pub name_weight: f64,

    /// Weight of an exact trigger type match.
    #[serde(default = "default_trigger_weight")]
    pub trigger_weight: f64,

    /// Weight of the action-type overlap.
    #[serde(default = "default_action_weight")]
    pub action_weight: f64,

    /// A pair is a duplicate when its score is strictly above this value.
    #[serde(default = "default_duplicate_threshold")]
    pub threshold: f64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            name_weight: default_name_weight(),
            trigger_weight: default_trigger_weight(),
            action_weight: default_action_weight(),
            threshold: default_duplicate_threshold(),
        }
    }
}

fn default_name_weight() -> f64 {
    0.4
}

fn default_trigger_weight() -> f64 {
    0.3
}

fn default_action_weight() -> f64 {
    0.3
}

fn default_duplicate_threshold() -> f64 {
    0.7
}

/// Orphan detector rule thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrphanConfig {
    /// Days without a run before a flow counts as stale.
    #[serde(default = "default_stale_days")]
    pub stale_days: i64,

    /// Success rate (percent) below which a flow is failing.
    #[serde(default = "default_orphan_min_success")]
    pub min_success_rate: f64,

    /// Error count above which a flow is erroring.
    #[serde(default = "default_max_errors")]
    pub max_error_count: u64,
}

impl Default for OrphanConfig {
    fn default() -> Self {
        Self {
            stale_days: default_stale_days(),
            min_success_rate: default_orphan_min_success(),
            max_error_count: default_max_errors(),
        }
    }
}

fn default_stale_days() -> i64 {
    30
}

fn default_orphan_min_success() -> f64 {
    50.0
}

fn default_max_errors() -> u64 {
    100
}

/// Anomaly detector rule thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Average execution time (seconds) above which a flow is slow.
    #[serde(default = "default_slow_seconds")]
    pub slow_execution_seconds: f64,

    /// Success rate (percent) below which a flow is unreliable.
    #[serde(default = "default_anomaly_min_success")]
    pub min_success_rate: f64,

    /// Cost per execution above which a flow is expensive.
    #[serde(default = "default_max_cost")]
    pub max_cost_per_execution: f64,

    /// Realtime flows with fewer monthly runs than this are over-triggered.
    #[serde(default = "default_realtime_min")]
    pub realtime_min_monthly_executions: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            slow_execution_seconds: default_slow_seconds(),
            min_success_rate: default_anomaly_min_success(),
            max_cost_per_execution: default_max_cost(),
            realtime_min_monthly_executions: default_realtime_min(),
        }
    }
}

fn default_slow_seconds() -> f64 {
    60.0
}

fn default_anomaly_min_success() -> f64 {
    85.0
}

fn default_max_cost() -> f64 {
    0.5
}

fn default_realtime_min() -> u64 {
    100
}

/// ROI model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiConfig {
    /// Manual minutes saved per action per execution.
    #[serde(default = "default_minutes_per_action")]
    pub minutes_per_action: f64,

    /// One-off setup cost charged against every flow.
    #[serde(default = "default_setup_cost")]
    pub setup_cost: f64,

    /// Hourly rate for departments missing from `hourly_rates`.
    #[serde(default = "default_hourly_rate")]
    pub default_hourly_rate: f64,

    /// Estimated automatable processes per existing flow.
    #[serde(default = "default_coverage_multiplier")]
    pub coverage_multiplier: f64,

    /// Revenue attributed to each sales flow execution.
    #[serde(default = "default_sales_revenue")]
    pub sales_revenue_per_execution: f64,

    /// Revenue attributed to each marketing flow execution.
    #[serde(default = "default_marketing_revenue")]
    pub marketing_revenue_per_execution: f64,

    /// Conversion improvement (percent) credited to sales flows.
    #[serde(default = "default_sales_conversion")]
    pub sales_conversion_impact: f64,

    /// Conversion improvement (percent) credited to marketing flows.
    #[serde(default = "default_marketing_conversion")]
    pub marketing_conversion_impact: f64,

    /// Hourly labor rate per department key. Keys are matched case-insensitively.
    #[serde(
        default = "default_hourly_rates",
        deserialize_with = "deserialize_rate_table"
    )]
    pub hourly_rates: BTreeMap<String, f64>,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            minutes_per_action: default_minutes_per_action(),
            setup_cost: default_setup_cost(),
            default_hourly_rate: default_hourly_rate(),
            coverage_multiplier: default_coverage_multiplier(),
            sales_revenue_per_execution: default_sales_revenue(),
            marketing_revenue_per_execution: default_marketing_revenue(),
            sales_conversion_impact: default_sales_conversion(),
            marketing_conversion_impact: default_marketing_conversion(),
            hourly_rates: default_hourly_rates(),
        }
    }
}

fn default_minutes_per_action() -> f64 {
    5.0
}

fn default_setup_cost() -> f64 {
    500.0
}

fn default_hourly_rate() -> f64 {
    45.0
}

fn default_hourly_rates() -> BTreeMap<String, f64> {
    [
        ("sales", 50.0),
        ("marketing", 45.0),
        ("support", 35.0),
        ("operations", 40.0),
        ("finance", 55.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Reads `[roi.hourly_rates]` with keys folded to department keys.
fn deserialize_rate_table<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let table = BTreeMap::<String, f64>::deserialize(deserializer)?;
    Ok(table
        .into_iter()
        .map(|(department, rate)| (Department::from(department.as_str()).key().to_string(), rate))
        .collect())
}

fn default_coverage_multiplier() -> f64 {
    1.5
}

fn default_sales_revenue() -> f64 {
    50.0
}

fn default_marketing_revenue() -> f64 {
    15.0
}

fn default_sales_conversion() -> f64 {
    5.0
}

fn default_marketing_conversion() -> f64 {
    3.0
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check that every threshold can drive the heuristics.
    pub fn validate(&self) -> Result<()> {
        let d = &self.duplicates;
        for (name, weight) in [
            ("name_weight", d.name_weight),
            ("trigger_weight", d.trigger_weight),
            ("action_weight", d.action_weight),
        ] {
            ensure!(
                weight.is_finite() && weight >= 0.0,
                "duplicates.{} must be a non-negative number",
                name
            );
        }
        ensure!(
            d.name_weight + d.trigger_weight + d.action_weight > 0.0,
            "duplicate weights must not all be zero"
        );
        ensure!(
            (0.0..=1.0).contains(&d.threshold),
            "duplicates.threshold must be between 0.0 and 1.0"
        );

        ensure!(self.orphans.stale_days >= 0, "orphans.stale_days must not be negative");
        ensure!(
            (0.0..=100.0).contains(&self.orphans.min_success_rate),
            "orphans.min_success_rate must be between 0 and 100"
        );
        ensure!(
            (0.0..=100.0).contains(&self.anomalies.min_success_rate),
            "anomalies.min_success_rate must be between 0 and 100"
        );

        let r = &self.roi;
        ensure!(
            r.setup_cost.is_finite() && r.setup_cost > 0.0,
            "roi.setup_cost must be greater than zero"
        );
        ensure!(
            r.minutes_per_action.is_finite() && r.minutes_per_action >= 0.0,
            "roi.minutes_per_action must not be negative"
        );
        ensure!(
            r.coverage_multiplier.is_finite() && r.coverage_multiplier > 0.0,
            "roi.coverage_multiplier must be greater than zero"
        );
        for (department, rate) in &r.hourly_rates {
            ensure!(
                rate.is_finite() && *rate >= 0.0,
                "roi.hourly_rates.{} must not be negative",
                department
            );
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.duplicates.threshold, 0.7);
        assert_eq!(config.orphans.stale_days, 30);
        assert_eq!(config.roi.setup_cost, 500.0);
        assert_eq!(config.roi.hourly_rates.get("finance"), Some(&55.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "atlas.json"
format = "json"
verbose = true

[duplicates]
threshold = 0.8

[roi]
setup_cost = 250.0

[roi.hourly_rates]
Legal = 90.0
Ops = 42.0
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_path(), PathBuf::from("atlas.json"));
        assert_eq!(config.general.format, OutputFormat::Json);
        assert!(config.general.verbose);
        assert_eq!(config.duplicates.threshold, 0.8);
        assert_eq!(config.duplicates.name_weight, 0.4);
        assert_eq!(config.roi.setup_cost, 250.0);
        assert_eq!(config.roi.hourly_rates.get("legal"), Some(&90.0));
        assert_eq!(config.roi.hourly_rates.get("operations"), Some(&42.0));
        assert_eq!(config.anomalies.slow_execution_seconds, 60.0);
    }

    #[test]
    fn test_default_output_follows_format() {
        let mut general = GeneralConfig::default();
        assert_eq!(general.output_path(), PathBuf::from("flowatlas_report.md"));

        general.format = OutputFormat::Json;
        assert_eq!(general.output_path(), PathBuf::from("flowatlas_report.json"));

        general.output = Some("out/atlas.md".to_string());
        assert_eq!(general.output_path(), PathBuf::from("out/atlas.md"));
    }

    #[test]
    fn test_validation_rejects_zero_setup_cost() {
        let mut config = Config::default();
        config.roi.setup_cost = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_threshold_out_of_range() {
        let mut config = Config::default();
        config.duplicates.threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[orphans]\nstale_days = 14\n",
        )
        .unwrap();

        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.orphans.stale_days, 14);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[roi]\nsetup_cost = -1.0\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[duplicates]"));
        assert!(toml_str.contains("[roi.hourly_rates]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.roi.hourly_rates.len(), 5);
    }
}
