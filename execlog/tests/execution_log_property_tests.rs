// Property-based tests for the execution log builder and formatter

use execlog::aggregation::builder::bucket_window;
use execlog::aggregation::{format_execution_log_value, get_execution_log_aggregation};
use execlog::errors::ExecutionLogError;
use execlog::models::{
    ExecutionLogQuery, ExecutionLogResult, SortField, SortOrder, SortSpec,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn query(page: i64, per_page: i64, sort: Vec<SortSpec>) -> ExecutionLogQuery {
    ExecutionLogQuery {
        filter: None,
        page,
        per_page,
        sort,
    }
}

fn default_sort() -> Vec<SortSpec> {
    vec![SortSpec::new(SortField::Timestamp, SortOrder::Desc)]
}

fn sort_field() -> impl Strategy<Value = SortField> {
    prop::sample::select(SortField::ALL.to_vec())
}

fn sort_order() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)]
}

fn response_with_bucket(bucket: Value) -> Value {
    json!({
        "aggregations": {
            "excludeExecuteStart": {
                "executionUuidCardinality": {
                    "executionUuidCardinality": { "value": 1 }
                },
                "executionUuid": { "buckets": [bucket] }
            }
        }
    })
}

// Property: page window
//
// For any valid page and page size the bucket sort starts at
// (page - 1) * per_page and returns per_page groups
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_bucket_sort_window(page in 1i64..10_000, per_page in 1i64..1_000) {
        let value = get_execution_log_aggregation(&query(page, per_page, default_sort()))
            .unwrap()
            .to_value();
        let bucket_sort =
            &value["excludeExecuteStart"]["aggs"]["executionUuid"]["aggs"]["executionUuidSorted"]["bucket_sort"];

        prop_assert_eq!(&bucket_sort["from"], &json!((page - 1) * per_page));
        prop_assert_eq!(&bucket_sort["size"], &json!(per_page));
        prop_assert_eq!(
            bucket_window(page as u64, per_page as u64),
            Some((((page - 1) * per_page) as u64, per_page as u64))
        );
    }
}

// Property: unknown sort fields are rejected
//
// The error names the offending field and lists the whole vocabulary
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_unknown_sort_field_rejected(
        field in "[a-z_]{1,24}".prop_filter("must not be a sort field", |f| f.parse::<SortField>().is_err()),
        order in sort_order(),
    ) {
        let sort = vec![SortSpec { field: field.clone(), order }];
        let err = get_execution_log_aggregation(&query(1, 10, sort)).unwrap_err();

        prop_assert_eq!(
            err,
            ExecutionLogError::InvalidSortField {
                field,
                valid: SortField::vocabulary(),
            }
        );
    }
}

// Property: every known sort field maps to its backend path
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_known_sort_field_accepted(field in sort_field(), order in sort_order()) {
        let value = get_execution_log_aggregation(&query(1, 10, vec![SortSpec::new(field, order)]))
            .unwrap()
            .to_value();
        let terms = &value["excludeExecuteStart"]["aggs"]["executionUuid"]["terms"];

        prop_assert_eq!(
            &terms["order"],
            &json!([{ field.backend_path(): order.as_str() }])
        );
    }
}

// Property: non-positive page or page size is rejected
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_non_positive_page_rejected(page in i64::MIN..=0, per_page in 1i64..100) {
        let err = get_execution_log_aggregation(&query(page, per_page, default_sort())).unwrap_err();
        prop_assert_eq!(err, ExecutionLogError::InvalidPage(page));
    }

    #[test]
    fn property_non_positive_per_page_rejected(page in 1i64..100, per_page in i64::MIN..=0) {
        let err = get_execution_log_aggregation(&query(page, per_page, default_sort())).unwrap_err();
        prop_assert_eq!(err, ExecutionLogError::InvalidPerPage(per_page));
    }
}

// Property: a response without the execution log aggregation is an empty page
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_missing_aggregation_is_empty(
        extra in prop::collection::btree_map(
            "[a-z]{1,10}".prop_filter("reserved key", |k| k != "aggregations"),
            any::<i64>(),
            0..5,
        )
    ) {
        let raw = serde_json::to_value(&extra).unwrap();
        prop_assert_eq!(format_execution_log_value(&raw).unwrap(), ExecutionLogResult::empty());
    }
}

// Property: nanosecond metrics are reported in milliseconds
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_nanoseconds_become_milliseconds(
        duration_ms in 0u64..1_000_000,
        delay_ms in 0u64..1_000_000,
    ) {
        let bucket = json!({
            "key": "uuid",
            "ruleExecution": {
                "executionDuration": { "value": (duration_ms * 1_000_000) as f64 },
                "scheduleDelay": { "value": (delay_ms * 1_000_000) as f64 }
            }
        });
        let result = format_execution_log_value(&response_with_bucket(bucket)).unwrap();

        prop_assert_eq!(result.data[0].duration_ms, duration_ms as f64);
        prop_assert_eq!(result.data[0].schedule_delay_ms, delay_ms as f64);
    }
}

// Property: a failed execution reports "<message> - <error message>"
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_failure_message_composition(
        message in "[a-zA-Z0-9 ]{0,30}",
        error_message in "[a-zA-Z0-9 ]{0,30}",
    ) {
        let bucket = json!({
            "key": "uuid",
            "ruleExecution": {
                "outcomeAndMessage": { "hits": { "hits": [{ "_source": {
                    "event": { "outcome": "failure" },
                    "message": message,
                    "error": { "message": error_message }
                } }] } }
            }
        });
        let result = format_execution_log_value(&response_with_bucket(bucket)).unwrap();

        prop_assert_eq!(&result.data[0].status, "failure");
        prop_assert_eq!(&result.data[0].message, &format!("{} - {}", message, error_message));
    }

    #[test]
    fn property_success_message_is_untouched(message in "[a-zA-Z0-9 ]{0,30}") {
        let bucket = json!({
            "key": "uuid",
            "ruleExecution": {
                "outcomeAndMessage": { "hits": { "hits": [{ "_source": {
                    "event": { "outcome": "success" },
                    "message": message,
                    "error": { "message": "ignored" }
                } }] } }
            }
        });
        let result = format_execution_log_value(&response_with_bucket(bucket)).unwrap();
        prop_assert_eq!(&result.data[0].message, &message);
    }
}

// Property: action outcome counts come from their own buckets only
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_action_outcome_counts(
        succeeded in prop::option::of(0u64..1_000),
        errored in prop::option::of(0u64..1_000),
    ) {
        let mut buckets = Vec::new();
        if let Some(n) = succeeded {
            buckets.push(json!({ "key": "success", "doc_count": n }));
        }
        if let Some(n) = errored {
            buckets.push(json!({ "key": "failure", "doc_count": n }));
        }
        let bucket = json!({
            "key": "uuid",
            "actionExecution": { "actionOutcomes": { "buckets": buckets } }
        });
        let result = format_execution_log_value(&response_with_bucket(bucket)).unwrap();

        prop_assert_eq!(result.data[0].num_succeeded_actions, succeeded.unwrap_or(0));
        prop_assert_eq!(result.data[0].num_errored_actions, errored.unwrap_or(0));
    }
}
