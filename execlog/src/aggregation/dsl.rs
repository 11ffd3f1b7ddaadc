// Aggregation request model
//
// Each stage is a tagged variant; nesting is expressed through named child
// aggregations so a tree can be built and inspected stage by stage.

use crate::models::{SortOptions, SortOrder};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Queries
// ============================================================================

/// Query clause used by filter aggregations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Bool(BoolQuery),
    Term(BTreeMap<String, String>),
    Match(BTreeMap<String, String>),
    /// Pre-rendered clause, e.g. a translated user filter
    #[serde(untagged)]
    Raw(Value),
}

impl Query {
    pub fn term(field: &str, value: &str) -> Self {
        Query::Term(BTreeMap::from([(field.to_string(), value.to_string())]))
    }

    pub fn match_value(field: &str, value: &str) -> Self {
        Query::Match(BTreeMap::from([(field.to_string(), value.to_string())]))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn build(self) -> Query {
        Query::Bool(self)
    }
}

// ============================================================================
// Aggregation stages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldAgg {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermsAgg {
    pub field: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<BTreeMap<String, SortOrder>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    Skip,
    InsertZeros,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSortAgg {
    pub sort: Vec<BTreeMap<String, SortOptions>>,
    pub from: u64,
    pub size: u64,
    pub gap_policy: GapPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFilter {
    pub includes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopHitsAgg {
    pub size: u64,
    #[serde(rename = "_source")]
    pub source: SourceFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Script {
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSelectorAgg {
    pub buckets_path: BTreeMap<String, String>,
    pub script: Script,
}

/// The kind of a single aggregation, serialized as `{"<kind>": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Filter(Query),
    Terms(TermsAgg),
    Cardinality(FieldAgg),
    Min(FieldAgg),
    Max(FieldAgg),
    BucketSort(BucketSortAgg),
    TopHits(TopHitsAgg),
    BucketSelector(BucketSelectorAgg),
}

/// Named aggregations in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregationMap(Vec<(String, Aggregation)>);

impl AggregationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, agg: Aggregation) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = agg,
            None => self.0.push((name, agg)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Aggregation> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        // Serializing plain data into a Value cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for AggregationMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, agg) in &self.0 {
            map.serialize_entry(name, agg)?;
        }
        map.end()
    }
}

/// One aggregation plus its named children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    #[serde(flatten)]
    pub kind: AggregationKind,
    #[serde(skip_serializing_if = "AggregationMap::is_empty")]
    pub aggs: AggregationMap,
}

impl Aggregation {
    pub fn new(kind: AggregationKind) -> Self {
        Self {
            kind,
            aggs: AggregationMap::new(),
        }
    }

    pub fn filter(query: Query) -> Self {
        Self::new(AggregationKind::Filter(query))
    }

    pub fn terms(field: &str, size: u64) -> Self {
        Self::new(AggregationKind::Terms(TermsAgg {
            field: field.to_string(),
            size,
            order: Vec::new(),
        }))
    }

    pub fn cardinality(field: &str) -> Self {
        Self::new(AggregationKind::Cardinality(FieldAgg {
            field: field.to_string(),
        }))
    }

    pub fn min(field: &str) -> Self {
        Self::new(AggregationKind::Min(FieldAgg {
            field: field.to_string(),
        }))
    }

    pub fn max(field: &str) -> Self {
        Self::new(AggregationKind::Max(FieldAgg {
            field: field.to_string(),
        }))
    }

    pub fn bucket_sort(sort: Vec<BTreeMap<String, SortOptions>>, from: u64, size: u64) -> Self {
        Self::new(AggregationKind::BucketSort(BucketSortAgg {
            sort,
            from,
            size,
            gap_policy: GapPolicy::InsertZeros,
        }))
    }

    pub fn top_hits(size: u64, includes: &[&str]) -> Self {
        Self::new(AggregationKind::TopHits(TopHitsAgg {
            size,
            source: SourceFilter {
                includes: includes.iter().map(|s| s.to_string()).collect(),
            },
        }))
    }

    pub fn bucket_selector(path_name: &str, path: &str, script: &str) -> Self {
        Self::new(AggregationKind::BucketSelector(BucketSelectorAgg {
            buckets_path: BTreeMap::from([(path_name.to_string(), path.to_string())]),
            script: Script {
                source: script.to_string(),
            },
        }))
    }

    /// Set the bucket order of a terms aggregation; ignored for other kinds
    pub fn order(mut self, order: Vec<BTreeMap<String, SortOrder>>) -> Self {
        if let AggregationKind::Terms(terms) = &mut self.kind {
            terms.order = order;
        }
        self
    }

    pub fn agg(mut self, name: &str, child: Aggregation) -> Self {
        self.aggs.insert(name, child);
        self
    }

    pub fn sub(&self, name: &str) -> Option<&Aggregation> {
        self.aggs.get(name)
    }
}
