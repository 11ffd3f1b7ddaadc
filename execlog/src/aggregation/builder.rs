// Execution log aggregation builder
//
// Groups event log documents by execution uuid, pages over the groups and
// collects one row of metrics per execution on the requested page only.

use super::dsl::{Aggregation, AggregationMap, BoolQuery, Query};
use super::fields::{agg_names, event_fields, event_values, DEFAULT_MAX_BUCKETS_LIMIT};
use crate::config::ExecutionLogConfig;
use crate::errors::ExecutionLogError;
use crate::kuery::{self, to_elasticsearch_query};
use crate::models::{ExecutionLogQuery, Filter, SortField, SortOptions, SortOrder, SortSpec};
use crate::telemetry;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Offset and size of the bucket window for a page: `((page - 1) * per_page, per_page)`
///
/// Callers must have validated `page >= 1` and `per_page >= 1`. `None` when the
/// offset does not fit in a `u64`.
pub fn bucket_window(page: u64, per_page: u64) -> Option<(u64, u64)> {
    let from = page.saturating_sub(1).checked_mul(per_page)?;
    Some((from, per_page))
}

/// Sort directives in `bucket_sort` form: `[{"<path>": {"order": "desc"}}]`
pub fn format_sort_for_bucket_sort(
    sort: &[(SortField, SortOrder)],
) -> Vec<BTreeMap<String, SortOptions>> {
    sort.iter()
        .map(|(field, order)| {
            BTreeMap::from([(
                field.backend_path().to_string(),
                SortOptions { order: *order },
            )])
        })
        .collect()
}

/// Sort directives in terms `order` form: `[{"<path>": "desc"}]`
pub fn format_sort_for_term_sort(sort: &[(SortField, SortOrder)]) -> Vec<BTreeMap<String, SortOrder>> {
    sort.iter()
        .map(|(field, order)| BTreeMap::from([(field.backend_path().to_string(), *order)]))
        .collect()
}

fn provider_and_action_filter(provider: &str, action: &str) -> Query {
    BoolQuery::new()
        .must(Query::match_value(event_fields::ACTION, action))
        .must(Query::match_value(event_fields::PROVIDER, provider))
        .build()
}

/// Rule `execute` events, narrowed by the caller's filter when one is given
fn rule_execute_filter(dsl_filter: Option<&Value>) -> Query {
    let mut query = BoolQuery::new();
    if let Some(filter) = dsl_filter {
        query = query.filter(Query::Raw(filter.clone()));
    }
    query
        .must(provider_and_action_filter(
            event_values::ALERTING_PROVIDER,
            event_values::EXECUTE_ACTION,
        ))
        .build()
}

fn translate_filter(filter: Option<&Filter>) -> Result<Option<Value>, ExecutionLogError> {
    match filter {
        None => Ok(None),
        Some(Filter::Node(node)) => Ok(Some(to_elasticsearch_query(node))),
        Some(Filter::Kuery(expression)) => kuery::parse(expression)
            .map(|node| node.as_ref().map(to_elasticsearch_query))
            .map_err(|e| ExecutionLogError::InvalidFilterSyntax {
                filter: expression.clone(),
                reason: e.to_string(),
            }),
    }
}

fn resolve_sort(sort: &[SortSpec]) -> Result<Vec<(SortField, SortOrder)>, ExecutionLogError> {
    sort.iter().map(SortSpec::resolve).collect()
}

/// Builds the execution log aggregation request
#[derive(Debug, Clone)]
pub struct ExecutionLogAggregationBuilder {
    max_buckets: u64,
}

impl Default for ExecutionLogAggregationBuilder {
    fn default() -> Self {
        Self {
            max_buckets: DEFAULT_MAX_BUCKETS_LIMIT,
        }
    }
}

impl ExecutionLogAggregationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_buckets(max_buckets: u64) -> Self {
        Self { max_buckets }
    }

    pub fn from_config(config: &ExecutionLogConfig) -> Self {
        Self::with_max_buckets(config.max_buckets_limit)
    }

    pub fn max_buckets(&self) -> u64 {
        self.max_buckets
    }

    /// Validate the request and assemble the aggregation tree
    ///
    /// # Errors
    /// Fails before anything is built when a sort field is unknown, when
    /// `page` or `per_page` is not positive, or when the filter does not parse.
    #[instrument(skip(self, query), fields(page = query.page, per_page = query.per_page))]
    pub fn build(&self, query: &ExecutionLogQuery) -> Result<AggregationMap, ExecutionLogError> {
        match self.try_build(query) {
            Ok(aggs) => {
                telemetry::record_query_built(query.per_page);
                debug!(max_buckets = self.max_buckets, "Execution log aggregation built");
                Ok(aggs)
            }
            Err(e) => {
                telemetry::record_query_rejected(e.reason());
                warn!(error = %e, "Rejected execution log request");
                Err(e)
            }
        }
    }

    fn try_build(&self, query: &ExecutionLogQuery) -> Result<AggregationMap, ExecutionLogError> {
        let sort = resolve_sort(&query.sort)?;

        if query.page <= 0 {
            return Err(ExecutionLogError::InvalidPage(query.page));
        }
        if query.per_page <= 0 {
            return Err(ExecutionLogError::InvalidPerPage(query.per_page));
        }

        let (from, size) = bucket_window(query.page as u64, query.per_page as u64)
            .ok_or(ExecutionLogError::InvalidPage(query.page))?;

        let dsl_filter = translate_filter(query.filter.as_ref())?;

        let execution_uuid_cardinality =
            Aggregation::filter(rule_execute_filter(dsl_filter.as_ref())).agg(
                agg_names::EXECUTION_UUID_CARDINALITY,
                Aggregation::cardinality(event_fields::EXECUTION_UUID),
            );

        let execution_uuid = Aggregation::terms(event_fields::EXECUTION_UUID, self.max_buckets)
            .order(format_sort_for_term_sort(&sort))
            // Page over the groups before any per-group metric is computed
            .agg(
                agg_names::EXECUTION_UUID_SORTED,
                Aggregation::bucket_sort(format_sort_for_bucket_sort(&sort), from, size),
            )
            .agg(agg_names::ACTION_EXECUTION, action_execution())
            .agg(
                agg_names::RULE_EXECUTION,
                rule_execution(dsl_filter.as_ref()),
            )
            // Non-zero doc count means the execution timed out
            .agg(
                agg_names::TIMEOUT_MESSAGE,
                Aggregation::filter(provider_and_action_filter(
                    event_values::ALERTING_PROVIDER,
                    event_values::EXECUTE_TIMEOUT_ACTION,
                )),
            )
            // Drop uuids that only appear on unrelated events
            .agg(
                agg_names::MIN_EXECUTION_UUID_BUCKET,
                Aggregation::bucket_selector(
                    "count",
                    &format!("{}._count", agg_names::RULE_EXECUTION),
                    "params.count > 0",
                ),
            );

        let exclude_execute_start = Aggregation::filter(
            BoolQuery::new()
                .must_not(Query::term(
                    event_fields::ACTION,
                    event_values::EXECUTE_START_ACTION,
                ))
                .build(),
        )
        .agg(
            agg_names::EXECUTION_UUID_CARDINALITY,
            execution_uuid_cardinality,
        )
        .agg(agg_names::EXECUTION_UUID, execution_uuid);

        let mut aggs = AggregationMap::new();
        aggs.insert(agg_names::EXCLUDE_EXECUTE_START, exclude_execute_start);
        Ok(aggs)
    }
}

fn action_execution() -> Aggregation {
    Aggregation::filter(provider_and_action_filter(
        event_values::ACTIONS_PROVIDER,
        event_values::EXECUTE_ACTION,
    ))
    .agg(
        agg_names::ACTION_OUTCOMES,
        Aggregation::terms(event_fields::OUTCOME, 2),
    )
}

fn rule_execution(dsl_filter: Option<&Value>) -> Aggregation {
    Aggregation::filter(rule_execute_filter(dsl_filter))
        .agg(
            agg_names::EXECUTE_START_TIME,
            Aggregation::min(event_fields::START),
        )
        .agg(
            agg_names::SCHEDULE_DELAY,
            Aggregation::max(event_fields::SCHEDULE_DELAY),
        )
        .agg(
            agg_names::TOTAL_SEARCH_DURATION,
            Aggregation::max(event_fields::TOTAL_SEARCH_DURATION),
        )
        .agg(
            agg_names::ES_SEARCH_DURATION,
            Aggregation::max(event_fields::ES_SEARCH_DURATION),
        )
        .agg(
            agg_names::NUM_TRIGGERED_ACTIONS,
            Aggregation::max(event_fields::NUMBER_OF_TRIGGERED_ACTIONS),
        )
        .agg(
            agg_names::NUM_GENERATED_ACTIONS,
            Aggregation::max(event_fields::NUMBER_OF_GENERATED_ACTIONS),
        )
        .agg(
            agg_names::NUM_ACTIVE_ALERTS,
            Aggregation::max(event_fields::NUMBER_OF_ACTIVE_ALERTS),
        )
        .agg(
            agg_names::NUM_RECOVERED_ALERTS,
            Aggregation::max(event_fields::NUMBER_OF_RECOVERED_ALERTS),
        )
        .agg(
            agg_names::NUM_NEW_ALERTS,
            Aggregation::max(event_fields::NUMBER_OF_NEW_ALERTS),
        )
        .agg(
            agg_names::EXECUTION_DURATION,
            Aggregation::max(event_fields::DURATION),
        )
        .agg(
            agg_names::OUTCOME_AND_MESSAGE,
            Aggregation::top_hits(
                1,
                &[
                    event_fields::OUTCOME,
                    event_fields::MESSAGE,
                    event_fields::ERROR_MESSAGE,
                    event_fields::VERSION,
                    event_fields::RULE_ID,
                    event_fields::RULE_NAME,
                ],
            ),
        )
}

/// Build the execution log aggregation with the default bucket cap
pub fn get_execution_log_aggregation(
    query: &ExecutionLogQuery,
) -> Result<AggregationMap, ExecutionLogError> {
    ExecutionLogAggregationBuilder::new().build(query)
}
