//! Report rendering.
//!
//! Turns an [`AnalyticsReport`](crate::analysis::AnalyticsReport) into
//! Markdown or JSON.

pub mod generator;

pub use generator::*;
