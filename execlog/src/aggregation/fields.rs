// Event log document fields and aggregation names
// Single source of truth for everything the builder writes and the formatter reads

/// Document fields of the event log index
pub mod event_fields {
    pub const RULE_ID: &str = "rule.id";
    pub const RULE_NAME: &str = "rule.name";
    pub const PROVIDER: &str = "event.provider";
    pub const START: &str = "event.start";
    pub const ACTION: &str = "event.action";
    pub const OUTCOME: &str = "event.outcome";
    /// Nanoseconds
    pub const DURATION: &str = "event.duration";
    pub const MESSAGE: &str = "message";
    pub const VERSION: &str = "kibana.version";
    pub const ERROR_MESSAGE: &str = "error.message";
    /// Nanoseconds
    pub const SCHEDULE_DELAY: &str = "kibana.task.schedule_delay";
    pub const ES_SEARCH_DURATION: &str =
        "kibana.alert.rule.execution.metrics.es_search_duration_ms";
    pub const TOTAL_SEARCH_DURATION: &str =
        "kibana.alert.rule.execution.metrics.total_search_duration_ms";
    pub const NUMBER_OF_TRIGGERED_ACTIONS: &str =
        "kibana.alert.rule.execution.metrics.number_of_triggered_actions";
    pub const NUMBER_OF_GENERATED_ACTIONS: &str =
        "kibana.alert.rule.execution.metrics.number_of_generated_actions";
    pub const NUMBER_OF_ACTIVE_ALERTS: &str =
        "kibana.alert.rule.execution.metrics.alert_counts.active";
    pub const NUMBER_OF_NEW_ALERTS: &str = "kibana.alert.rule.execution.metrics.alert_counts.new";
    pub const NUMBER_OF_RECOVERED_ALERTS: &str =
        "kibana.alert.rule.execution.metrics.alert_counts.recovered";
    pub const EXECUTION_UUID: &str = "kibana.alert.rule.execution.uuid";
}

/// Values of `event.provider` and `event.action`
pub mod event_values {
    pub const ALERTING_PROVIDER: &str = "alerting";
    pub const ACTIONS_PROVIDER: &str = "actions";
    pub const EXECUTE_ACTION: &str = "execute";
    pub const EXECUTE_START_ACTION: &str = "execute-start";
    pub const EXECUTE_TIMEOUT_ACTION: &str = "execute-timeout";
    pub const SUCCESS_OUTCOME: &str = "success";
    pub const FAILURE_OUTCOME: &str = "failure";
}

/// Names given to the aggregations, shared by request and response
pub mod agg_names {
    pub const EXCLUDE_EXECUTE_START: &str = "excludeExecuteStart";
    pub const EXECUTION_UUID_CARDINALITY: &str = "executionUuidCardinality";
    pub const EXECUTION_UUID: &str = "executionUuid";
    pub const EXECUTION_UUID_SORTED: &str = "executionUuidSorted";
    pub const ACTION_EXECUTION: &str = "actionExecution";
    pub const ACTION_OUTCOMES: &str = "actionOutcomes";
    pub const RULE_EXECUTION: &str = "ruleExecution";
    pub const EXECUTE_START_TIME: &str = "executeStartTime";
    pub const SCHEDULE_DELAY: &str = "scheduleDelay";
    pub const TOTAL_SEARCH_DURATION: &str = "totalSearchDuration";
    pub const ES_SEARCH_DURATION: &str = "esSearchDuration";
    pub const NUM_TRIGGERED_ACTIONS: &str = "numTriggeredActions";
    pub const NUM_GENERATED_ACTIONS: &str = "numGeneratedActions";
    pub const NUM_ACTIVE_ALERTS: &str = "numActiveAlerts";
    pub const NUM_RECOVERED_ALERTS: &str = "numRecoveredAlerts";
    pub const NUM_NEW_ALERTS: &str = "numNewAlerts";
    pub const EXECUTION_DURATION: &str = "executionDuration";
    pub const OUTCOME_AND_MESSAGE: &str = "outcomeAndMessage";
    pub const TIMEOUT_MESSAGE: &str = "timeoutMessage";
    pub const MIN_EXECUTION_UUID_BUCKET: &str = "minExecutionUuidBucket";
}

/// Do not group more than this many executions
pub const DEFAULT_MAX_BUCKETS_LIMIT: u64 = 1000;

/// Backend durations are nanoseconds
pub const NANOS_PER_MILLI: f64 = 1_000_000.0;
