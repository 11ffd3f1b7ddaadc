use super::{KueryNode, Literal};
use serde_json::{json, Value};

/// Translate a parsed filter into a backend bool query
pub fn to_elasticsearch_query(node: &KueryNode) -> Value {
    match node {
        KueryNode::And { children } => json!({
            "bool": {
                "filter": children.iter().map(to_elasticsearch_query).collect::<Vec<_>>()
            }
        }),
        KueryNode::Or { children } => json!({
            "bool": {
                "should": children.iter().map(to_elasticsearch_query).collect::<Vec<_>>(),
                "minimum_should_match": 1
            }
        }),
        KueryNode::Not { child } => json!({
            "bool": { "must_not": to_elasticsearch_query(child) }
        }),
        KueryNode::Is { field: None, value } => match value {
            Literal::Text(text) => json!({
                "multi_match": { "type": "best_fields", "query": text, "lenient": true }
            }),
            Literal::Phrase(text) => json!({
                "multi_match": { "type": "phrase", "query": text, "lenient": true }
            }),
            Literal::Wildcard(pattern) => json!({
                "query_string": { "query": pattern }
            }),
        },
        KueryNode::Is {
            field: Some(field),
            value,
        } => {
            let clause = match value {
                Literal::Text(text) => json!({ "match": { field.as_str(): text } }),
                Literal::Phrase(text) => json!({ "match_phrase": { field.as_str(): text } }),
                Literal::Wildcard(pattern) => json!({
                    "query_string": { "fields": [field], "query": pattern }
                }),
            };
            should_one(clause)
        }
        KueryNode::Range { field, op, value } => should_one(json!({
            "range": { field.as_str(): { op.as_str(): range_value(value) } }
        })),
        KueryNode::Exists { field } => should_one(json!({ "exists": { "field": field } })),
    }
}

fn should_one(clause: Value) -> Value {
    json!({ "bool": { "should": [clause], "minimum_should_match": 1 } })
}

/// Numeric bounds are sent as numbers, everything else (dates) as text
fn range_value(value: &str) -> Value {
    if let Ok(n) = value.parse::<i64>() {
        return json!(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() => json!(f),
        _ => json!(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kuery::parse;

    fn translate(input: &str) -> Value {
        to_elasticsearch_query(&parse(input).unwrap().unwrap())
    }

    #[test]
    fn test_match_clause() {
        assert_eq!(
            translate("event.outcome: failure"),
            json!({
                "bool": {
                    "should": [{ "match": { "event.outcome": "failure" } }],
                    "minimum_should_match": 1
                }
            })
        );
    }

    #[test]
    fn test_and_uses_filter_context() {
        let query = translate("rule.id: abc and not event.outcome: success");
        assert_eq!(query["bool"]["filter"].as_array().unwrap().len(), 2);
        assert_eq!(
            query["bool"]["filter"][1]["bool"]["must_not"]["bool"]["should"][0]["match"]
                ["event.outcome"],
            json!("success")
        );
    }

    #[test]
    fn test_or_requires_one_match() {
        let query = translate("a: 1 or b: 2");
        assert_eq!(query["bool"]["minimum_should_match"], json!(1));
        assert_eq!(query["bool"]["should"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_phrase_and_exists() {
        assert_eq!(
            translate(r#"message: "rule timed out""#)["bool"]["should"][0],
            json!({ "match_phrase": { "message": "rule timed out" } })
        );
        assert_eq!(
            translate("error.message: *")["bool"]["should"][0],
            json!({ "exists": { "field": "error.message" } })
        );
    }

    #[test]
    fn test_wildcard_uses_query_string() {
        assert_eq!(
            translate("rule.name: cpu*")["bool"]["should"][0],
            json!({ "query_string": { "fields": ["rule.name"], "query": "cpu*" } })
        );
    }

    #[test]
    fn test_range_values() {
        assert_eq!(
            translate("kibana.task.schedule_delay > 1000")["bool"]["should"][0],
            json!({ "range": { "kibana.task.schedule_delay": { "gt": 1000 } } })
        );
        assert_eq!(
            translate("event.start <= \"2022-03-01T00:00:00Z\"")["bool"]["should"][0],
            json!({ "range": { "event.start": { "lte": "2022-03-01T00:00:00Z" } } })
        );
    }

    #[test]
    fn test_free_text() {
        assert_eq!(
            translate("timeout"),
            json!({ "multi_match": { "type": "best_fields", "query": "timeout", "lenient": true } })
        );
    }
}
