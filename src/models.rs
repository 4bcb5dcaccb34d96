//! Data models for flow records.
//!
//! This module contains the flow record consumed by every analysis pass,
//! together with the small enums shared by the detectors. Field names
//! follow the camelCase layout of the exported store records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Severity of an orphan finding, or impact of an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low - worth a look when convenient
    Low,
    /// Medium - likely wasted spend or neglected automation
    Medium,
    /// High - broken or failing automation
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🟠",
        }
    }
}

/// Department owning a flow.
///
/// Unknown department names are kept in `Other` as a trimmed, lowercase
/// key, so `Legal` and ` legal` name the same department.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Department {
    Sales,
    Marketing,
    Support,
    Operations,
    Finance,
    Other(String),
}

impl Department {
    /// Departments with a known labor rate, in reporting order.
    pub const KNOWN: [Department; 5] = [
        Department::Sales,
        Department::Marketing,
        Department::Support,
        Department::Operations,
        Department::Finance,
    ];

    /// Lowercase key used in configuration tables and serialized output.
    pub fn key(&self) -> &str {
        match self {
            Department::Sales => "sales",
            Department::Marketing => "marketing",
            Department::Support => "support",
            Department::Operations => "operations",
            Department::Finance => "finance",
            Department::Other(s) => s,
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Department::Sales => write!(f, "Sales"),
            Department::Marketing => write!(f, "Marketing"),
            Department::Support => write!(f, "Support"),
            Department::Operations => write!(f, "Operations"),
            Department::Finance => write!(f, "Finance"),
            Department::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Department {
    fn from(s: &str) -> Self {
        let key = s.trim().to_lowercase();
        match key.as_str() {
            "sales" => Department::Sales,
            "marketing" => Department::Marketing,
            "support" => Department::Support,
            "operations" | "ops" => Department::Operations,
            "finance" => Department::Finance,
            _ => Department::Other(key),
        }
    }
}

impl From<String> for Department {
    fn from(s: String) -> Self {
        Department::from(s.as_str())
    }
}

impl From<Department> for String {
    fn from(department: Department) -> Self {
        department.key().to_string()
    }
}

/// Lifecycle state reported by the source platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    #[default]
    Active,
    Disabled,
    Error,
}

/// What starts a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Webhook,
    Schedule,
    Manual,
    Event,
}

/// How often a flow is expected to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Realtime,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

/// Business value label assigned by the flow owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessValue {
    High,
    Medium,
    Low,
}

/// Trigger definition of a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// A single step executed by a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    /// Tag compared across flows (e.g. `slack_message`).
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Spend attributed to a flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub monthly: f64,
    pub per_execution: f64,
}

/// Runtime health counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub error_count: u64,
    pub warning_count: u64,
    #[serde(default)]
    pub avg_response_time: f64,
}

/// An automation flow pulled from a third-party platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// Unique identifier within a data set.
    pub id: String,
    /// Display name, compared by the duplicate detector.
    pub name: String,
    /// Source platform (zapier, make, hubspot, ...).
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub summary: String,
    pub department: Department,
    pub trigger: Trigger,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub status: FlowStatus,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
    /// Seconds.
    pub avg_execution_time: f64,
    #[serde(default)]
    pub monthly_executions: u64,
    #[serde(default)]
    pub total_executions: u64,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default)]
    pub performance: Performance,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    pub frequency: Frequency,
    /// Duplicate link declared by the source platform. Informational only.
    #[serde(default)]
    pub duplicate_of: Option<String>,
    /// Orphan mark set by the source store. Counted in metrics, not by the detector.
    #[serde(default)]
    pub orphan: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_value: Option<BusinessValue>,
}

/// Compact `{id, name}` view of a flow used in serialized results.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FlowRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

impl Flow {
    /// Returns the `{id, name}` reference used in reports.
    pub fn as_ref_record(&self) -> FlowRef<'_> {
        FlowRef {
            id: &self.id,
            name: &self.name,
        }
    }
}

/// Serializes a borrowed flow as its `{id, name}` reference.
pub(crate) fn serialize_flow_ref<S>(flow: &&Flow, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    flow.as_ref_record().serialize(serializer)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::Medium.max(Severity::High), Severity::High);
    }

    #[test]
    fn test_severity_emoji() {
        assert_eq!(Severity::High.emoji(), "🟠");
        assert_eq!(Severity::Medium.emoji(), "🟡");
        assert_eq!(Severity::Low.emoji(), "🟢");
    }

    #[test]
    fn test_department_from_str() {
        assert_eq!(Department::from("sales"), Department::Sales);
        assert_eq!(Department::from("Marketing"), Department::Marketing);
        assert_eq!(Department::from("FINANCE"), Department::Finance);
        assert_eq!(
            Department::from("legal"),
            Department::Other("legal".to_string())
        );
    }

    #[test]
    fn test_flow_deserializes_store_record() {
        let json = r#"{
            "id": "f1",
            "name": "Deal Won → Slack Notification",
            "tool": "zapier",
            "duplicateOf": null,
            "orphan": false,
            "trigger": { "type": "webhook", "config": { "source": "salesforce" } },
            "actions": [ { "id": "a1", "type": "slack_message", "config": {} } ],
            "frequency": "realtime",
            "lastRun": "2025-07-21T07:45:00Z",
            "nextRun": null,
            "successRate": 98.5,
            "avgExecutionTime": 1.2,
            "totalExecutions": 234,
            "monthlyExecutions": 47,
            "cost": { "monthly": 23.5, "perExecution": 0.5 },
            "performance": { "errorCount": 3, "warningCount": 1, "avgResponseTime": 1.2 },
            "owner": "john.doe@company.com",
            "department": "sales",
            "businessValue": "high"
        }"#;

        let flow: Flow = serde_json::from_str(json).unwrap();
        assert_eq!(flow.id, "f1");
        assert_eq!(flow.department, Department::Sales);
        assert_eq!(flow.status, FlowStatus::Active);
        assert_eq!(flow.trigger.trigger_type, TriggerType::Webhook);
        assert_eq!(flow.actions[0].action_type, "slack_message");
        assert_eq!(flow.performance.error_count, 3);
        assert_eq!(flow.cost.per_execution, 0.5);
        assert!(flow.last_run.is_some());
        assert_eq!(flow.business_value, Some(BusinessValue::High));
        assert!(!flow.orphan);
    }

    #[test]
    fn test_unknown_department_is_case_insensitive() {
        assert_eq!(Department::from("Legal"), Department::from(" legal "));
        assert_eq!(Department::from("LEGAL").key(), "legal");

        let mut flow = fixtures::flow("f1", "Invoice sync");
        flow.department = Department::from("Legal");

        let json = serde_json::to_value(&flow).unwrap();
        assert_eq!(json["department"], "legal");
    }

    #[test]
    fn test_flow_ref_serialization() {
        #[derive(Serialize)]
        struct Wrapper<'a> {
            #[serde(serialize_with = "serialize_flow_ref")]
            flow: &'a Flow,
        }

        let flow = fixtures::flow("f7", "Lead → CRM");
        let json = serde_json::to_value(Wrapper { flow: &flow }).unwrap();
        assert_eq!(json["flow"]["id"], "f7");
        assert_eq!(json["flow"]["name"], "Lead → CRM");
        assert!(json["flow"].get("actions").is_none());
    }
}
