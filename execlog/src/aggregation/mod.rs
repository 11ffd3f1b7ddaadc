// Execution log aggregation: request builder, response model and formatter

pub mod builder;
pub mod dsl;
pub mod fields;
pub mod formatter;
pub mod response;

pub use builder::{get_execution_log_aggregation, ExecutionLogAggregationBuilder};
pub use dsl::{Aggregation, AggregationKind, AggregationMap};
pub use formatter::{format_execution_log_result, format_execution_log_value};
pub use response::AggregateEventsResult;
