// Aggregation response model
// Every level is optional: the backend omits empty sub-aggregations and null metrics.

use serde::Deserialize;

/// Raw result of an aggregate-events call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateEventsResult {
    pub aggregations: Option<ExecutionLogAggregations>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogAggregations {
    pub exclude_execute_start: Option<ExcludeExecuteStartAgg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludeExecuteStartAgg {
    pub execution_uuid_cardinality: Option<CardinalityFilterAgg>,
    pub execution_uuid: Option<BucketsAgg<ExecutionUuidBucket>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardinalityFilterAgg {
    pub execution_uuid_cardinality: Option<ValueAgg>,
}

/// Single-value metric (`min`, `max`, `cardinality`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValueAgg {
    pub value: Option<f64>,
    pub value_as_string: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocCountAgg {
    pub doc_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketsAgg<T> {
    #[serde(default = "Vec::new")]
    pub buckets: Vec<T>,
}

impl<T> Default for BucketsAgg<T> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionUuidBucket {
    pub key: Option<String>,
    #[serde(rename = "doc_count")]
    pub doc_count: Option<u64>,
    pub timeout_message: Option<DocCountAgg>,
    pub rule_execution: Option<RuleExecutionAgg>,
    pub action_execution: Option<ActionExecutionAgg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleExecutionAgg {
    #[serde(rename = "doc_count")]
    pub doc_count: Option<u64>,
    pub execute_start_time: Option<ValueAgg>,
    pub execution_duration: Option<ValueAgg>,
    pub schedule_delay: Option<ValueAgg>,
    pub es_search_duration: Option<ValueAgg>,
    pub total_search_duration: Option<ValueAgg>,
    pub num_triggered_actions: Option<ValueAgg>,
    pub num_generated_actions: Option<ValueAgg>,
    pub num_active_alerts: Option<ValueAgg>,
    pub num_recovered_alerts: Option<ValueAgg>,
    pub num_new_alerts: Option<ValueAgg>,
    pub outcome_and_message: Option<TopHitsAgg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecutionAgg {
    pub action_outcomes: Option<BucketsAgg<KeyedBucket>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyedBucket {
    pub key: Option<String>,
    pub doc_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopHitsAgg {
    pub hits: Option<HitsEnvelope>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hit {
    #[serde(rename = "_source")]
    pub source: Option<OutcomeSource>,
}

/// `_source` subset requested by the `outcomeAndMessage` top hit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutcomeSource {
    pub event: Option<EventSource>,
    pub message: Option<String>,
    pub error: Option<ErrorSource>,
    pub kibana: Option<KibanaSource>,
    pub rule: Option<RuleSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventSource {
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorSource {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KibanaSource {
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl RuleExecutionAgg {
    /// `_source` of the representative document, if the top hit returned one
    pub fn outcome_source(&self) -> Option<&OutcomeSource> {
        self.outcome_and_message
            .as_ref()?
            .hits
            .as_ref()?
            .hits
            .first()?
            .source
            .as_ref()
    }
}

impl ActionExecutionAgg {
    /// Doc count of the outcome bucket with the given key
    pub fn outcome_count(&self, outcome: &str) -> Option<u64> {
        self.action_outcomes
            .as_ref()?
            .buckets
            .iter()
            .find(|b| b.key.as_deref() == Some(outcome))?
            .doc_count
    }
}
