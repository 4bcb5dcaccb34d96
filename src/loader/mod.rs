//! Flow loader for exported store records.
//!
//! This module reads flow records from a JSON export (a single file
//! holding an array) or a directory of JSON files, and checks the
//! data-model invariants before any analysis runs.

use crate::error::FlowValidationError;
use crate::models::{Department, Flow};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Load and validate flows from a file or directory.
pub fn load_flows(path: &Path) -> Result<Vec<Flow>> {
    let flows = if path.is_dir() {
        load_directory(path)?
    } else {
        load_file(path)?
    };

    validate_flows(&flows)
        .with_context(|| format!("Invalid flow data in {}", path.display()))?;

    info!("Loaded {} flows from {}", flows.len(), path.display());
    Ok(flows)
}

/// Parse flows from a JSON string (array or single object).
///
/// Record errors name the offending flow position and field.
pub fn parse_flows(json: &str) -> Result<Vec<Flow>> {
    let document: Value = serde_json::from_str(json).context("Failed to parse flow records")?;

    match document {
        Value::Array(records) => records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let id = record_id(&record);
                serde_path_to_error::deserialize::<_, Flow>(record)
                    .with_context(|| format!("Invalid flow record at index {}{}", index, id))
            })
            .collect(),
        Value::Object(_) => {
            let id = record_id(&document);
            let flow: Flow = serde_path_to_error::deserialize(document)
                .with_context(|| format!("Invalid flow record{}", id))?;
            Ok(vec![flow])
        }
        other => bail!(
            "Expected a flow object or an array of flows, found {}",
            json_kind(&other)
        ),
    }
}

/// ` (id 'f1')` suffix for error messages, empty when the record has no id.
fn record_id(record: &Value) -> String {
    record
        .get("id")
        .and_then(Value::as_str)
        .map(|id| format!(" (id '{}')", id))
        .unwrap_or_default()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn load_file(path: &Path) -> Result<Vec<Flow>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read flow file: {}", path.display()))?;

    parse_flows(&content).with_context(|| format!("Failed to load {}", path.display()))
}

fn load_directory(dir: &Path) -> Result<Vec<Flow>> {
    let files = json_files(dir);

    if files.is_empty() {
        warn!("No JSON files found in {}", dir.display());
    }

    let mut flows = Vec::new();
    for file in files {
        let mut loaded = load_file(&file)?;
        debug!("{}: {} flows", file.display(), loaded.len());
        flows.append(&mut loaded);
    }

    Ok(flows)
}

/// Collect `*.json` files below `dir` in file-name order, skipping hidden entries.
fn json_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("json"))
        .map(|e| e.into_path())
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Check the invariants every detector relies on.
///
/// Ids must be non-empty and unique, the success rate must lie in
/// `[0, 100]`, and every numeric field must be finite and non-negative.
pub fn validate_flows(flows: &[Flow]) -> Result<(), FlowValidationError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(flows.len());

    for (index, flow) in flows.iter().enumerate() {
        if flow.id.trim().is_empty() {
            return Err(FlowValidationError::EmptyId { index });
        }
        if !seen.insert(flow.id.as_str()) {
            return Err(FlowValidationError::DuplicateId {
                id: flow.id.clone(),
            });
        }

        if !(0.0..=100.0).contains(&flow.success_rate) {
            return Err(FlowValidationError::SuccessRateOutOfRange {
                id: flow.id.clone(),
                value: flow.success_rate,
            });
        }

        for (field, value) in [
            ("avgExecutionTime", flow.avg_execution_time),
            ("cost.monthly", flow.cost.monthly),
            ("cost.perExecution", flow.cost.per_execution),
            ("performance.avgResponseTime", flow.performance.avg_response_time),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FlowValidationError::InvalidNumber {
                    id: flow.id.clone(),
                    field,
                    value,
                });
            }
        }
    }

    Ok(())
}

/// Keep only the flows owned by `department`.
pub fn filter_department(flows: Vec<Flow>, department: &Department) -> Vec<Flow> {
    flows
        .into_iter()
        .filter(|f| &f.department == department)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use tempfile::TempDir;

    fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/flows.json")
    }

    #[test]
    fn test_load_fixture_file() {
        let flows = load_flows(&fixture_path()).unwrap();
        assert_eq!(flows.len(), 8);
        assert_eq!(flows[0].id, "f1");
        assert_eq!(flows[1].duplicate_of.as_deref(), Some("f1"));
    }

    #[test]
    fn test_load_directory_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        let a = serde_json::to_string(&vec![fixtures::flow("a1", "First")]).unwrap();
        let b = serde_json::to_string(&fixtures::flow("b1", "Second")).unwrap();
        std::fs::write(temp_dir.path().join("b.json"), b).unwrap();
        std::fs::write(temp_dir.path().join("a.json"), a).unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(temp_dir.path().join(".cache")).unwrap();
        std::fs::write(temp_dir.path().join(".cache/c.json"), "not json").unwrap();

        let flows = load_flows(temp_dir.path()).unwrap();
        let ids: Vec<_> = flows.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b1"]);
    }

    #[test]
    fn test_load_rejects_duplicate_ids_across_files() {
        let temp_dir = TempDir::new().unwrap();
        let one = serde_json::to_string(&fixtures::flow("f1", "One")).unwrap();
        std::fs::write(temp_dir.path().join("a.json"), &one).unwrap();
        std::fs::write(temp_dir.path().join("b.json"), &one).unwrap();

        let err = load_flows(temp_dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("duplicate flow id 'f1'"));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_flows("{ not json").is_err());
        assert!(parse_flows("42").is_err());
    }

    #[test]
    fn test_parse_error_names_record_and_field() {
        let mut record = serde_json::to_value(fixtures::flow("f2", "Bad rate")).unwrap();
        record["successRate"] = serde_json::json!("high");
        let json = serde_json::to_string(&vec![
            serde_json::to_value(fixtures::flow("f1", "Fine")).unwrap(),
            record,
        ])
        .unwrap();

        let message = format!("{:#}", parse_flows(&json).unwrap_err());
        assert!(message.contains("index 1 (id 'f2')"), "{}", message);
        assert!(message.contains("successRate: invalid type"), "{}", message);
    }

    #[test]
    fn test_parse_single_object() {
        let json = serde_json::to_string(&fixtures::flow("f1", "Solo")).unwrap();
        let flows = parse_flows(&json).unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].id, "f1");
    }

    #[test]
    fn test_validate_success_rate_range() {
        let mut flow = fixtures::flow("f1", "Bad");
        flow.success_rate = 120.0;

        assert_eq!(
            validate_flows(&[flow]),
            Err(FlowValidationError::SuccessRateOutOfRange {
                id: "f1".to_string(),
                value: 120.0
            })
        );
    }

    #[test]
    fn test_validate_negative_cost() {
        let mut flow = fixtures::flow("f1", "Bad");
        flow.cost.monthly = -3.0;

        match validate_flows(&[flow]) {
            Err(FlowValidationError::InvalidNumber { field, .. }) => {
                assert_eq!(field, "cost.monthly")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_empty_id() {
        let flow = fixtures::flow("  ", "Nameless");
        assert_eq!(
            validate_flows(&[flow]),
            Err(FlowValidationError::EmptyId { index: 0 })
        );
    }

    #[test]
    fn test_validate_empty_set() {
        assert!(validate_flows(&[]).is_ok());
    }

    #[test]
    fn test_filter_department() {
        let mut support = fixtures::flow("f2", "Ticket triage");
        support.department = Department::Support;
        let flows = vec![fixtures::flow("f1", "Deal won"), support];

        let filtered = filter_department(flows, &Department::Support);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "f2");
    }
}
