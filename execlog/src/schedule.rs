// Rule schedule intervals
//
// Parses `{number}{unit}` intervals and estimates how many executions a rule
// runs inside a time window.

use crate::aggregation::fields::DEFAULT_MAX_BUCKETS_LIMIT;
use crate::errors::ScheduleError;
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DURATION_RE: Regex =
        Regex::new(r"^([1-9][0-9]*)([smhd])$").expect("Invalid regex pattern");
}

/// Parse an interval such as `30s`, `5m`, `1h` or `2d`
pub fn parse_duration(interval: &str) -> Result<Duration, ScheduleError> {
    let invalid = || ScheduleError::InvalidDuration(interval.to_string());
    let caps = DURATION_RE.captures(interval).ok_or_else(invalid)?;

    let amount: i64 = caps[1].parse().map_err(|_| invalid())?;
    let duration = match &caps[2] {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    };

    duration.ok_or_else(invalid)
}

/// Number of executions between `start` and `end` for a rule on `schedule`
///
/// Clamped to `[0, DEFAULT_MAX_BUCKETS_LIMIT]`.
pub fn get_num_executions(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    schedule: &str,
) -> Result<u64, ScheduleError> {
    get_num_executions_capped(start, end, schedule, DEFAULT_MAX_BUCKETS_LIMIT)
}

/// [`get_num_executions`] with an explicit upper bound
pub fn get_num_executions_capped(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    schedule: &str,
    max_buckets: u64,
) -> Result<u64, ScheduleError> {
    let interval_ms = parse_duration(schedule)?.num_milliseconds();
    let window_ms = (end - start).num_milliseconds();

    if window_ms <= 0 {
        return Ok(0);
    }

    // ceil for positive operands; interval_ms is at least 1000
    let executions = (window_ms + interval_ms - 1) / interval_ms;
    Ok((executions as u64).min(max_buckets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_650_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_parse_valid_durations() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::minutes(5));
        assert_eq!(parse_duration("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_duration("2d").unwrap(), Duration::days(2));
    }

    #[test]
    fn test_parse_invalid_durations() {
        for input in ["", "5", "m", "0s", "05m", "1w", "1.5h", " 1h", "-1m"] {
            assert_eq!(
                parse_duration(input),
                Err(ScheduleError::InvalidDuration(input.to_string())),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_overflowing_duration_is_invalid() {
        assert!(parse_duration("99999999999999999999d").is_err());
        assert!(parse_duration("9999999999999999d").is_err());
    }

    #[test]
    fn test_num_executions_rounds_up() {
        assert_eq!(get_num_executions(at(0), at(60), "1m").unwrap(), 1);
        assert_eq!(get_num_executions(at(0), at(61), "1m").unwrap(), 2);
        assert_eq!(get_num_executions(at(0), at(3600), "10s").unwrap(), 360);
    }

    #[test]
    fn test_num_executions_reversed_window_is_zero() {
        assert_eq!(get_num_executions(at(60), at(0), "1s").unwrap(), 0);
        assert_eq!(get_num_executions(at(0), at(0), "1s").unwrap(), 0);
    }

    #[test]
    fn test_num_executions_is_capped() {
        let end = at(0) + Duration::days(30);
        assert_eq!(
            get_num_executions(at(0), end, "1s").unwrap(),
            DEFAULT_MAX_BUCKETS_LIMIT
        );
        assert_eq!(get_num_executions_capped(at(0), end, "1s", 50).unwrap(), 50);
    }

    #[test]
    fn test_num_executions_invalid_schedule() {
        assert!(matches!(
            get_num_executions(at(0), at(60), "often"),
            Err(ScheduleError::InvalidDuration(_))
        ));
    }
}
