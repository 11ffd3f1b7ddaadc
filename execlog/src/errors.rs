// Error handling framework
// Request-shape errors are surfaced immediately; nothing here is retried.

use thiserror::Error;

/// Errors raised while building an execution log query or reading its response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionLogError {
    #[error("Invalid sort field \"{field}\" - must be one of [{valid}]")]
    InvalidSortField { field: String, valid: String },

    #[error("Invalid page field \"{0}\" - must be greater than 0")]
    InvalidPage(i64),

    #[error("Invalid perPage field \"{0}\" - must be greater than 0")]
    InvalidPerPage(i64),

    #[error("Invalid kuery syntax for filter {filter}: {reason}")]
    InvalidFilterSyntax { filter: String, reason: String },

    #[error("Malformed aggregation response: {0}")]
    MalformedResponse(String),
}

impl ExecutionLogError {
    /// Short machine-readable reason, used as a metric label
    pub fn reason(&self) -> &'static str {
        match self {
            ExecutionLogError::InvalidSortField { .. } => "invalid_sort_field",
            ExecutionLogError::InvalidPage(_) => "invalid_page",
            ExecutionLogError::InvalidPerPage(_) => "invalid_per_page",
            ExecutionLogError::InvalidFilterSyntax { .. } => "invalid_filter_syntax",
            ExecutionLogError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Filter expression parse errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KueryError {
    #[error("Unexpected '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("Expected {expected} but reached end of input")]
    UnexpectedEnd { expected: String },

    #[error("Unterminated quoted string starting at position {0}")]
    UnterminatedString(usize),

    #[error("Invalid escape sequence at position {0}")]
    InvalidEscape(usize),

    #[error("Expression nested too deeply at position {position}")]
    TooDeep { position: usize },
}

/// Version gate errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VersionError {
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("cannot upgrade agent to {version} because it is higher than the installed kibana version {kibana_version}")]
    VersionTooHigh {
        version: String,
        kibana_version: String,
    },
}

/// Schedule interval errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid duration \"{0}\". Durations must be of the form {{number}}{{unit}}. Example: 5s, 5m, 5h or 5d")]
    InvalidDuration(String),
}

/// API response error type for HTTP-shaped callers
#[derive(Debug, serde::Serialize)]
pub struct ApiError {
    pub code: String,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            status_code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", 400, message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<ExecutionLogError> for ApiError {
    fn from(err: ExecutionLogError) -> Self {
        match &err {
            ExecutionLogError::MalformedResponse(_) => {
                ApiError::new("MALFORMED_RESPONSE", 502, err.to_string())
            }
            ExecutionLogError::InvalidSortField { field, valid } => {
                let details = serde_json::json!({
                    "field": field,
                    "valid": valid.split(',').collect::<Vec<_>>(),
                });
                ApiError::bad_request(err.to_string()).with_details(details)
            }
            _ => ApiError::bad_request(err.to_string()),
        }
    }
}

impl From<VersionError> for ApiError {
    fn from(err: VersionError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<serde_json::Error> for ExecutionLogError {
    fn from(err: serde_json::Error) -> Self {
        ExecutionLogError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sort_field_display() {
        let err = ExecutionLogError::InvalidSortField {
            field: "foo".to_string(),
            valid: "timestamp,execution_duration".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid sort field \"foo\" - must be one of [timestamp,execution_duration]"
        );
    }

    #[test]
    fn test_invalid_page_display() {
        let err = ExecutionLogError::InvalidPage(0);
        assert_eq!(
            err.to_string(),
            "Invalid page field \"0\" - must be greater than 0"
        );
    }

    #[test]
    fn test_execution_log_error_to_api_error() {
        let api_err: ApiError = ExecutionLogError::InvalidPerPage(-1).into();
        assert_eq!(api_err.code, "BAD_REQUEST");
        assert_eq!(api_err.status_code, 400);
        assert!(api_err.details.is_none());
    }

    #[test]
    fn test_sort_field_error_carries_details() {
        let api_err: ApiError = ExecutionLogError::InvalidSortField {
            field: "foo".to_string(),
            valid: "a,b".to_string(),
        }
        .into();
        assert_eq!(
            api_err.details,
            Some(serde_json::json!({"field": "foo", "valid": ["a", "b"]}))
        );
    }

    #[test]
    fn test_malformed_response_is_not_a_bad_request() {
        let api_err: ApiError = ExecutionLogError::MalformedResponse("x".to_string()).into();
        assert_eq!(api_err.status_code, 502);
    }

    #[test]
    fn test_version_too_high_display() {
        let err = VersionError::VersionTooHigh {
            version: "8.5.0".to_string(),
            kibana_version: "8.4.0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot upgrade agent to 8.5.0 because it is higher than the installed kibana version 8.4.0"
        );
    }
}
