// Execution log CLI entry point
//
// Usage: execlog <command> [arguments]

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use execlog::aggregation::{format_execution_log_value, ExecutionLogAggregationBuilder};
use execlog::config::Settings;
use execlog::models::{ExecutionLogQuery, Filter, SortSpec};
use execlog::schedule::get_num_executions_capped;
use execlog::telemetry;
use execlog::version::check_kibana_version;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

fn print_usage() {
    eprintln!("execlog - rule execution log query toolkit");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  execlog <command> [arguments]");
    eprintln!("  execlog --help");
    eprintln!();
    eprintln!("  execlog query [--filter <KQL>] [--page <N>] [--per-page <N>] [--sort <FIELD[:asc|desc]>]...");
    eprintln!("  execlog format <FILE|->");
    eprintln!("  execlog check-version <VERSION> [<KIBANA_VERSION>]");
    eprintln!("  execlog estimate <START> <END> <INTERVAL>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  query          Print the execution log aggregation for a page");
    eprintln!("  format         Flatten a raw aggregation response into execution records");
    eprintln!("  check-version  Fail if VERSION is newer than the kibana version");
    eprintln!("  estimate       Estimate executions between two RFC 3339 timestamps");
    eprintln!();
    eprintln!("Query arguments:");
    eprintln!("  --filter <KQL>      Filter expression, e.g. 'event.outcome: failure'");
    eprintln!("  --page <N>          1-based page number (default: 1)");
    eprintln!("  --per-page <N>      Page size (default: execution_log.default_per_page)");
    eprintln!("  --sort <SPEC>       Sort directive, repeatable (default: timestamp:desc)");
    eprintln!();
    eprintln!("Configuration is read from config/default.toml, config/local.toml and");
    eprintln!("EXECLOG__<SECTION>__<KEY> environment variables.");
}

#[derive(Debug, PartialEq)]
enum Command {
    Query {
        filter: Option<String>,
        page: i64,
        per_page: Option<i64>,
        sort: Vec<SortSpec>,
    },
    Format {
        input: Option<PathBuf>,
    },
    CheckVersion {
        version: String,
        kibana_version: Option<String>,
    },
    Estimate {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: String,
    },
    Help,
}

fn option_value<'a>(args: &'a [String], i: usize) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} requires an argument", args[i]))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid RFC 3339 timestamp: {}", value))?;
    Ok(parsed.with_timezone(&Utc))
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some(command) = args.get(1) else {
        return Err(anyhow::anyhow!("Missing command"));
    };

    match command.as_str() {
        "--help" | "-h" | "help" => Ok(Command::Help),
        "query" => {
            let mut filter = None;
            let mut page = 1;
            let mut per_page = None;
            let mut sort = Vec::new();

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--filter" => {
                        filter = Some(option_value(args, i)?.to_string());
                        i += 2;
                    }
                    "--page" => {
                        let value = option_value(args, i)?;
                        page = value
                            .parse()
                            .with_context(|| format!("Invalid --page value: {}", value))?;
                        i += 2;
                    }
                    "--per-page" => {
                        let value = option_value(args, i)?;
                        per_page = Some(
                            value
                                .parse()
                                .with_context(|| format!("Invalid --per-page value: {}", value))?,
                        );
                        i += 2;
                    }
                    "--sort" => {
                        let spec = option_value(args, i)?
                            .parse::<SortSpec>()
                            .map_err(|e| anyhow::anyhow!(e))?;
                        sort.push(spec);
                        i += 2;
                    }
                    other => return Err(anyhow::anyhow!("Unknown argument: {}", other)),
                }
            }

            Ok(Command::Query {
                filter,
                page,
                per_page,
                sort,
            })
        }
        "format" => match &args[2..] {
            [] => Ok(Command::Format { input: None }),
            [path] if path == "-" => Ok(Command::Format { input: None }),
            [path] => Ok(Command::Format {
                input: Some(PathBuf::from(path)),
            }),
            _ => Err(anyhow::anyhow!("format takes a single input file")),
        },
        "check-version" => match &args[2..] {
            [version] => Ok(Command::CheckVersion {
                version: version.clone(),
                kibana_version: None,
            }),
            [version, kibana_version] => Ok(Command::CheckVersion {
                version: version.clone(),
                kibana_version: Some(kibana_version.clone()),
            }),
            _ => Err(anyhow::anyhow!(
                "check-version takes a version and an optional kibana version"
            )),
        },
        "estimate" => match &args[2..] {
            [start, end, interval] => Ok(Command::Estimate {
                start: parse_timestamp(start)?,
                end: parse_timestamp(end)?,
                interval: interval.clone(),
            }),
            _ => Err(anyhow::anyhow!("estimate takes <START> <END> <INTERVAL>")),
        },
        other => Err(anyhow::anyhow!("Unknown command: {}", other)),
    }
}

fn run_query(
    settings: &Settings,
    filter: Option<String>,
    page: i64,
    per_page: Option<i64>,
    sort: Vec<SortSpec>,
) -> Result<()> {
    let defaults = ExecutionLogQuery::default();
    let query = ExecutionLogQuery {
        filter: filter.map(Filter::from),
        page,
        per_page: per_page.unwrap_or(settings.execution_log.default_per_page as i64),
        sort: if sort.is_empty() { defaults.sort } else { sort },
    };

    let aggs = ExecutionLogAggregationBuilder::from_config(&settings.execution_log)
        .build(&query)
        .context("Failed to build execution log aggregation")?;

    println!("{}", serde_json::to_string_pretty(&aggs)?);
    Ok(())
}

fn run_format(input: Option<PathBuf>) -> Result<()> {
    let raw = match &input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Response is not valid JSON")?;
    let result = format_execution_log_value(&value).context("Failed to format response")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_check_version(
    settings: &Settings,
    version: &str,
    kibana_version: Option<&str>,
) -> Result<()> {
    let kibana_version = kibana_version.unwrap_or(&settings.versions.kibana_version);
    check_kibana_version(version, kibana_version)?;

    info!(version, kibana_version, "Version accepted");
    println!("ok");
    Ok(())
}

fn run_estimate(
    settings: &Settings,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: &str,
) -> Result<()> {
    let executions = get_num_executions_capped(
        start,
        end,
        interval,
        settings.execution_log.max_buckets_limit,
    )?;

    println!("{}", executions);
    Ok(())
}

fn run(command: Command, settings: &Settings) -> Result<()> {
    match command {
        Command::Query {
            filter,
            page,
            per_page,
            sort,
        } => run_query(settings, filter, page, per_page, sort),
        Command::Format { input } => run_format(input),
        Command::CheckVersion {
            version,
            kibana_version,
        } => run_check_version(settings, &version, kibana_version.as_deref()),
        Command::Estimate {
            start,
            end,
            interval,
        } => run_estimate(settings, start, end, &interval),
        Command::Help => {
            print_usage();
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::from(1);
        }
    };

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {}", e);
            return ExitCode::from(1);
        }
    };
    if let Err(e) = settings.validate() {
        eprintln!("Error: Invalid configuration: {}", e);
        return ExitCode::from(1);
    }

    if let Err(e) = telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.log_format,
    ) {
        eprintln!("Warning: {}", e);
    }
    telemetry::describe_metrics();
    debug!(?command, "Running command");

    match run(command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
