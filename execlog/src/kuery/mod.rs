// Filter expression language
//
// A small boolean query language (`field: value and not other > 5`) parsed into a
// `KueryNode` tree and translated into search backend bool-query DSL.

mod dsl;
mod lexer;
mod parser;

pub use dsl::to_elasticsearch_query;
pub use parser::{parse, MAX_DEPTH};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KueryNode {
    And { children: Vec<KueryNode> },
    Or { children: Vec<KueryNode> },
    Not { child: Box<KueryNode> },
    /// `field: value`, or a bare value matched against all fields when `field` is `None`
    Is {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        value: Literal,
    },
    Range {
        field: String,
        op: RangeOp,
        value: String,
    },
    Exists { field: String },
}

impl KueryNode {
    pub fn is(field: impl Into<String>, value: Literal) -> Self {
        KueryNode::Is {
            field: Some(field.into()),
            value,
        }
    }

    pub fn not(child: KueryNode) -> Self {
        KueryNode::Not {
            child: Box::new(child),
        }
    }
}

/// A value on the right-hand side of `field:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    /// Unquoted text, matched after analysis
    Text(String),
    /// Quoted text, matched as an exact phrase
    Phrase(String),
    /// Unquoted text containing `*`, stored as an escaped query_string pattern
    Wildcard(String),
}

impl Literal {
    pub fn text(s: impl Into<String>) -> Self {
        Literal::Text(s.into())
    }

    pub fn phrase(s: impl Into<String>) -> Self {
        Literal::Phrase(s.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Gte => "gte",
            RangeOp::Lt => "lt",
            RangeOp::Lte => "lte",
        }
    }
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            RangeOp::Gt => ">",
            RangeOp::Gte => ">=",
            RangeOp::Lt => "<",
            RangeOp::Lte => "<=",
        };
        f.write_str(symbol)
    }
}
