// Execution log result formatter
// Flattens execution uuid buckets into one record per execution.

use super::fields::{event_values, NANOS_PER_MILLI};
use super::response::{AggregateEventsResult, ExecutionUuidBucket, ValueAgg};
use crate::errors::ExecutionLogError;
use crate::models::{ExecutionLogEntry, ExecutionLogResult};
use crate::telemetry;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// Resolve an optional value to its default; missing never leaks into a record
fn or_default<T: Default>(value: Option<T>) -> T {
    value.unwrap_or_default()
}

fn metric(agg: Option<&ValueAgg>) -> f64 {
    or_default(agg.and_then(|a| a.value))
}

fn count(agg: Option<&ValueAgg>) -> u64 {
    // float-to-int casts saturate; NaN becomes 0
    metric(agg).round() as u64
}

fn text(value: Option<&String>) -> String {
    or_default(value.cloned())
}

/// Turn one execution uuid bucket into a record
pub fn format_execution_log_agg_bucket(bucket: &ExecutionUuidBucket) -> ExecutionLogEntry {
    let rule = bucket.rule_execution.as_ref();
    let source = rule.and_then(|r| r.outcome_source());
    let actions = bucket.action_execution.as_ref();

    let status = text(source.and_then(|s| s.event.as_ref()?.outcome.as_ref()));
    let message = text(source.and_then(|s| s.message.as_ref()));
    let message = if status == event_values::FAILURE_OUTCOME {
        let error_message = text(source.and_then(|s| s.error.as_ref()?.message.as_ref()));
        format!("{} - {}", message, error_message)
    } else {
        message
    };

    ExecutionLogEntry {
        id: text(bucket.key.as_ref()),
        timestamp: text(
            rule.and_then(|r| r.execute_start_time.as_ref()?.value_as_string.as_ref()),
        ),
        duration_ms: metric(rule.and_then(|r| r.execution_duration.as_ref())) / NANOS_PER_MILLI,
        status,
        message,
        version: text(source.and_then(|s| s.kibana.as_ref()?.version.as_ref())),
        num_active_alerts: count(rule.and_then(|r| r.num_active_alerts.as_ref())),
        num_new_alerts: count(rule.and_then(|r| r.num_new_alerts.as_ref())),
        num_recovered_alerts: count(rule.and_then(|r| r.num_recovered_alerts.as_ref())),
        num_triggered_actions: count(rule.and_then(|r| r.num_triggered_actions.as_ref())),
        num_generated_actions: count(rule.and_then(|r| r.num_generated_actions.as_ref())),
        num_succeeded_actions: or_default(
            actions.and_then(|a| a.outcome_count(event_values::SUCCESS_OUTCOME)),
        ),
        num_errored_actions: or_default(
            actions.and_then(|a| a.outcome_count(event_values::FAILURE_OUTCOME)),
        ),
        total_search_duration_ms: metric(rule.and_then(|r| r.total_search_duration.as_ref())),
        es_search_duration_ms: metric(rule.and_then(|r| r.es_search_duration.as_ref())),
        schedule_delay_ms: metric(rule.and_then(|r| r.schedule_delay.as_ref())) / NANOS_PER_MILLI,
        timed_out: or_default(
            bucket
                .timeout_message
                .as_ref()
                .and_then(|t| t.doc_count),
        ) > 0,
        rule_id: text(source.and_then(|s| s.rule.as_ref()?.id.as_ref())),
        rule_name: text(source.and_then(|s| s.rule.as_ref()?.name.as_ref())),
    }
}

/// Flatten an aggregate-events response into a page of execution records
///
/// A response without the execution log aggregation yields an empty result.
#[instrument(skip_all)]
pub fn format_execution_log_result(results: &AggregateEventsResult) -> ExecutionLogResult {
    let Some(aggs) = results
        .aggregations
        .as_ref()
        .and_then(|a| a.exclude_execute_start.as_ref())
    else {
        debug!("No execution log aggregation in response");
        return ExecutionLogResult::empty();
    };

    let total = count(
        aggs.execution_uuid_cardinality
            .as_ref()
            .and_then(|c| c.execution_uuid_cardinality.as_ref()),
    );
    let data: Vec<ExecutionLogEntry> = aggs
        .execution_uuid
        .as_ref()
        .map(|agg| {
            agg.buckets
                .iter()
                .map(format_execution_log_agg_bucket)
                .collect()
        })
        .unwrap_or_default();

    telemetry::record_entries_formatted(data.len());
    debug!(total, entries = data.len(), "Execution log result formatted");

    ExecutionLogResult { total, data }
}

/// Same as [`format_execution_log_result`] for an untyped JSON response
///
/// # Errors
/// Returns `MalformedResponse` when a present value has the wrong type.
pub fn format_execution_log_value(raw: &Value) -> Result<ExecutionLogResult, ExecutionLogError> {
    let results = AggregateEventsResult::deserialize(raw)?;
    Ok(format_execution_log_result(&results))
}
