// Rule execution log toolkit: aggregation query builder, result formatter,
// filter language and the agent upgrade version gate

pub mod aggregation;
pub mod config;
pub mod errors;
pub mod kuery;
pub mod models;
pub mod schedule;
pub mod telemetry;
pub mod version;

pub use aggregation::{
    format_execution_log_result, format_execution_log_value, get_execution_log_aggregation,
    ExecutionLogAggregationBuilder,
};
pub use errors::{ExecutionLogError, VersionError};
pub use models::{ExecutionLogEntry, ExecutionLogQuery, ExecutionLogResult};
pub use version::check_kibana_version;
