// Property-based tests for the filter expression language

use execlog::kuery::{parse, to_elasticsearch_query, KueryNode, Literal};
use proptest::prelude::*;
use serde_json::json;

fn is_keyword(s: &str) -> bool {
    ["and", "or", "not"]
        .iter()
        .any(|k| s.eq_ignore_ascii_case(k))
}

fn field_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}".prop_filter("keyword", |s| !is_keyword(s))
}

fn plain_value() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}".prop_filter("keyword", |s| !is_keyword(s))
}

// Property: `field: value` is a single match clause
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_field_value_translates_to_match(field in field_name(), value in plain_value()) {
        let node = parse(&format!("{}: {}", field, value)).unwrap().unwrap();
        prop_assert_eq!(&node, &KueryNode::is(field.clone(), Literal::text(value.clone())));

        prop_assert_eq!(
            to_elasticsearch_query(&node),
            json!({ "bool": {
                "should": [{ "match": { field.as_str(): value } }],
                "minimum_should_match": 1
            } })
        );
    }

    #[test]
    fn property_quoted_value_translates_to_match_phrase(
        field in field_name(),
        words in prop::collection::vec("[a-z]{1,6}", 1..4),
    ) {
        let phrase = words.join(" ");
        let node = parse(&format!("{}: \"{}\"", field, phrase)).unwrap().unwrap();
        let query = to_elasticsearch_query(&node);

        prop_assert_eq!(
            &query["bool"]["should"][0],
            &json!({ "match_phrase": { field.as_str(): phrase } })
        );
    }
}

// Property: `and` chains land in filter context, `or` chains need one match
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_boolean_chains(
        clauses in prop::collection::vec((field_name(), plain_value()), 2..6),
        use_or in any::<bool>(),
    ) {
        let joiner = if use_or { " or " } else { " and " };
        let expression = clauses
            .iter()
            .map(|(f, v)| format!("{}: {}", f, v))
            .collect::<Vec<_>>()
            .join(joiner);

        let query = to_elasticsearch_query(&parse(&expression).unwrap().unwrap());
        let key = if use_or { "should" } else { "filter" };
        let children = query["bool"][key].as_array().unwrap();

        prop_assert_eq!(children.len(), clauses.len());
        if use_or {
            prop_assert_eq!(&query["bool"]["minimum_should_match"], &json!(1));
        }
    }

    #[test]
    fn property_not_wraps_in_must_not(field in field_name(), value in plain_value()) {
        let query = to_elasticsearch_query(
            &parse(&format!("not {}: {}", field, value)).unwrap().unwrap(),
        );
        let inner = to_elasticsearch_query(&KueryNode::is(field, Literal::text(value)));
        prop_assert_eq!(&query["bool"]["must_not"], &inner);
    }
}

// Property: surrounding whitespace and keyword case never change the result
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_translation_is_stable(
        a in (field_name(), plain_value()),
        b in (field_name(), plain_value()),
        upper in any::<bool>(),
        padding in "[ \t]{0,3}",
    ) {
        let and = if upper { "AND" } else { "and" };
        let canonical = format!("{}: {} and {}: {}", a.0, a.1, b.0, b.1);
        let variant = format!("{pad}{}:{} {and} {}  :  {}{pad}", a.0, a.1, b.0, b.1, pad = padding, and = and);

        let expected = to_elasticsearch_query(&parse(&canonical).unwrap().unwrap());
        prop_assert_eq!(to_elasticsearch_query(&parse(&variant).unwrap().unwrap()), expected);
    }
}

// Property: blank input means no filter
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn property_blank_input_is_no_filter(blank in "[ \t\n]{0,8}") {
        prop_assert_eq!(parse(&blank).unwrap(), None);
    }
}
