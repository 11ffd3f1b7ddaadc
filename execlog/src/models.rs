use crate::errors::ExecutionLogError;
use crate::kuery::KueryNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Sorting
// ============================================================================

/// Fields an execution log can be sorted by
///
/// Each variant maps to exactly one metric inside the `ruleExecution` sub-aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Timestamp,
    ExecutionDuration,
    TotalSearchDuration,
    EsSearchDuration,
    ScheduleDelay,
    NumTriggeredActions,
    NumGeneratedActions,
    NumActiveAlerts,
    NumRecoveredAlerts,
    NumNewAlerts,
}

impl SortField {
    /// Every sortable field, in the order they are reported to callers
    pub const ALL: [SortField; 10] = [
        SortField::Timestamp,
        SortField::ExecutionDuration,
        SortField::TotalSearchDuration,
        SortField::EsSearchDuration,
        SortField::ScheduleDelay,
        SortField::NumTriggeredActions,
        SortField::NumGeneratedActions,
        SortField::NumActiveAlerts,
        SortField::NumRecoveredAlerts,
        SortField::NumNewAlerts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Timestamp => "timestamp",
            SortField::ExecutionDuration => "execution_duration",
            SortField::TotalSearchDuration => "total_search_duration",
            SortField::EsSearchDuration => "es_search_duration",
            SortField::ScheduleDelay => "schedule_delay",
            SortField::NumTriggeredActions => "num_triggered_actions",
            SortField::NumGeneratedActions => "num_generated_actions",
            SortField::NumActiveAlerts => "num_active_alerts",
            SortField::NumRecoveredAlerts => "num_recovered_alerts",
            SortField::NumNewAlerts => "num_new_alerts",
        }
    }

    /// Buckets path of the metric backing this field
    pub fn backend_path(&self) -> &'static str {
        match self {
            SortField::Timestamp => "ruleExecution>executeStartTime",
            SortField::ExecutionDuration => "ruleExecution>executionDuration",
            SortField::TotalSearchDuration => "ruleExecution>totalSearchDuration",
            SortField::EsSearchDuration => "ruleExecution>esSearchDuration",
            SortField::ScheduleDelay => "ruleExecution>scheduleDelay",
            SortField::NumTriggeredActions => "ruleExecution>numTriggeredActions",
            SortField::NumGeneratedActions => "ruleExecution>numGeneratedActions",
            SortField::NumActiveAlerts => "ruleExecution>numActiveAlerts",
            SortField::NumRecoveredAlerts => "ruleExecution>numRecoveredAlerts",
            SortField::NumNewAlerts => "ruleExecution>numNewAlerts",
        }
    }

    /// Comma-joined vocabulary, as shown in validation errors
    pub fn vocabulary() -> String {
        SortField::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ExecutionLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ExecutionLogError::InvalidSortField {
                field: s.to_string(),
                valid: SortField::vocabulary(),
            })
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortOptions {
    #[serde(default)]
    pub order: SortOrder,
}

/// One sort directive as supplied by a caller
///
/// The field name is kept as text so an unknown field can be reported back
/// verbatim; it is resolved against [`SortField`] when the query is built.
/// On the wire a directive is a single-key object: `{"timestamp": {"order": "desc"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, SortOptions>",
    into = "BTreeMap<String, SortOptions>"
)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self {
            field: field.as_str().to_string(),
            order,
        }
    }

    /// Resolve the field name against the sortable vocabulary
    pub fn resolve(&self) -> Result<(SortField, SortOrder), ExecutionLogError> {
        Ok((self.field.parse()?, self.order))
    }
}

impl TryFrom<BTreeMap<String, SortOptions>> for SortSpec {
    type Error = String;

    fn try_from(map: BTreeMap<String, SortOptions>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "sort directive must name exactly one field, got {}",
                map.len()
            ));
        }
        let (field, options) = map
            .into_iter()
            .next()
            .ok_or_else(|| "empty sort directive".to_string())?;
        Ok(Self {
            field,
            order: options.order,
        })
    }
}

impl From<SortSpec> for BTreeMap<String, SortOptions> {
    fn from(spec: SortSpec) -> Self {
        let mut map = BTreeMap::new();
        map.insert(spec.field, SortOptions { order: spec.order });
        map
    }
}

impl FromStr for SortSpec {
    type Err = String;

    /// Parse the `field:order` shorthand; the order defaults to `desc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = match s.split_once(':') {
            Some((field, order)) => (field.trim(), order.trim().parse()?),
            None => (s.trim(), SortOrder::default()),
        };
        if field.is_empty() {
            return Err(format!("Invalid sort directive: {}", s));
        }
        Ok(Self {
            field: field.to_string(),
            order,
        })
    }
}

// ============================================================================
// Query input
// ============================================================================

/// Optional filter: either a raw expression or an already parsed tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Kuery(String),
    Node(KueryNode),
}

impl From<&str> for Filter {
    fn from(s: &str) -> Self {
        Filter::Kuery(s.to_string())
    }
}

impl From<String> for Filter {
    fn from(s: String) -> Self {
        Filter::Kuery(s)
    }
}

impl From<KueryNode> for Filter {
    fn from(node: KueryNode) -> Self {
        Filter::Node(node)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Kuery(s) => f.write_str(s),
            Filter::Node(node) => write!(f, "{:?}", node),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

/// Execution log request parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page", alias = "perPage")]
    pub per_page: i64,
    #[serde(default)]
    pub sort: Vec<SortSpec>,
}

impl Default for ExecutionLogQuery {
    fn default() -> Self {
        Self {
            filter: None,
            page: default_page(),
            per_page: default_per_page(),
            sort: vec![SortSpec::new(SortField::Timestamp, SortOrder::Desc)],
        }
    }
}

// ============================================================================
// Query output
// ============================================================================

/// One flattened rule execution
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: String,
    pub timestamp: String,
    pub duration_ms: f64,
    pub status: String,
    pub message: String,
    pub version: String,
    pub num_active_alerts: u64,
    pub num_new_alerts: u64,
    pub num_recovered_alerts: u64,
    pub num_triggered_actions: u64,
    pub num_generated_actions: u64,
    pub num_succeeded_actions: u64,
    pub num_errored_actions: u64,
    pub total_search_duration_ms: f64,
    pub es_search_duration_ms: f64,
    pub schedule_delay_ms: f64,
    pub timed_out: bool,
    pub rule_id: String,
    pub rule_name: String,
}

/// A page of executions plus the distinct execution count of the whole filtered set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionLogResult {
    pub total: u64,
    pub data: Vec<ExecutionLogEntry>,
}

impl ExecutionLogResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
