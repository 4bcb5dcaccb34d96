//! Analytics for automation flow inventories.
//!
//! Given the flows pulled from automation platforms, this crate finds
//! near-duplicate flows, orphaned flows and performance anomalies, and
//! estimates per-flow and per-department ROI. All analysis functions are
//! pure: they borrow the flow slice and hold no state between calls.
//!
//! ```no_run
//! use chrono::Utc;
//! use flowatlas::{analysis, config::Config, loader};
//!
//! let flows = loader::load_flows("flows.json".as_ref())?;
//! let report = analysis::analyze(&flows, Utc::now(), &Config::default());
//! println!("{} duplicate groups", report.duplicates.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;

pub use analysis::{analyze, AnalyticsReport};
pub use error::FlowValidationError;
pub use models::{Department, Flow, Severity};
