// Telemetry module for structured logging and metrics

use crate::config::LogFormat;
use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Initialize structured logging
///
/// `RUST_LOG` wins over `log_level` when set. Fails if a global subscriber
/// is already installed.
#[tracing::instrument(skip_all)]
pub fn init_logging(log_level: &str, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Human => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::debug!(
        log_level = log_level,
        format = ?format,
        "Structured logging initialized"
    );

    Ok(())
}

/// Register descriptions for every execution log metric
///
/// Call once after installing a metrics recorder; without one this is a no-op.
pub fn describe_metrics() {
    describe_counter!(
        "execution_log_queries_built_total",
        "Total number of execution log aggregations built"
    );
    describe_counter!(
        "execution_log_queries_rejected_total",
        "Total number of execution log queries rejected during validation"
    );
    describe_counter!(
        "execution_log_entries_formatted_total",
        "Total number of execution log records produced from responses"
    );
    describe_histogram!(
        "execution_log_page_size",
        "Requested page size of built execution log queries"
    );
}

/// Record a successfully built aggregation
#[inline]
pub fn record_query_built(per_page: i64) {
    counter!("execution_log_queries_built_total").increment(1);
    histogram!("execution_log_page_size").record(per_page as f64);
}

/// Record a query rejected by validation
#[inline]
pub fn record_query_rejected(reason: &'static str) {
    counter!("execution_log_queries_rejected_total", "reason" => reason).increment(1);
}

/// Record records produced by the formatter
#[inline]
pub fn record_entries_formatted(count: usize) {
    counter!("execution_log_entries_formatted_total").increment(count as u64);
}
