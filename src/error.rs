//! Error handling.

use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::{event, Level};

use crate::reducer::ReducerError;
use crate::types::Key;

/// Salary dashboard error type
///
/// This type encapsulates the various errors that may occur while loading the dataset,
/// configuring dimensions and groups, and propagating filter changes.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Error parsing the CSV dataset
    #[error("failed to parse dataset")]
    Csv(#[from] csv::Error),

    /// A dimension was registered twice under the same name
    #[error("dimension {name} already exists")]
    DuplicateDimension { name: String },

    /// A chart was registered twice under the same name
    #[error("chart {name} already exists")]
    DuplicateChart { name: String },

    /// A group failed to match its incrementally maintained state
    #[error("incremental aggregate for key {key} in {group} diverges from full recompute")]
    GroupDivergence { group: String, key: Key },

    /// The coordinator stopped after a fatal error
    #[error("filter coordinator halted after fatal error: {cause}")]
    Halted { cause: String },

    /// A session command could not be parsed
    #[error("invalid command {command:?}: {reason}")]
    InvalidCommand { command: String, reason: String },

    /// Attempt to create a range filter with an empty range
    #[error("range lower bound {lo} must be less than upper bound {hi}")]
    InvalidRange { lo: Key, hi: Key },

    /// Error reading the dataset
    #[error("failed to read dataset")]
    Io(#[from] std::io::Error),

    /// Error serialising a chart snapshot
    #[error("failed to serialise output")]
    Json(#[from] serde_json::Error),

    /// A dataset row could not be converted into a record
    #[error("malformed record on line {line}")]
    MalformedRecord {
        line: u64,
        #[source]
        source: Box<DashboardError>,
    },

    /// A numeric field did not contain a non-negative integer
    #[error("field {field} is not a non-negative integer: {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    /// The chart does not accept selections
    #[error("chart {name} does not accept selections")]
    NotSelectable { name: String },

    /// A reducer failed to fold a record into an accumulator
    #[error("reducer failed for key {key} in {group}")]
    Reducer {
        group: String,
        key: Key,
        #[source]
        source: ReducerError,
    },

    /// Attempt to register more dimensions than the filter mask can represent
    #[error("too many dimensions (limit {limit})")]
    TooManyDimensions { limit: usize },

    /// Reference to a chart that was never registered
    #[error("unknown chart {name}")]
    UnknownChart { name: String },

    /// Reference to a dimension that was never registered
    #[error("unknown dimension {name}")]
    UnknownDimension { name: String },

    /// A group handle that does not belong to this crossfilter
    #[error("unknown group {index}")]
    UnknownGroup { index: usize },

    /// Error validating a record
    #[error("record is not valid")]
    Validation(#[from] validator::ValidationErrors),
}

impl DashboardError {
    /// Whether the error leaves aggregates in an undefined state.
    ///
    /// Fatal errors halt the filter coordinator.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DashboardError::Reducer { .. }
                | DashboardError::GroupDivergence { .. }
                | DashboardError::Halted { .. }
        )
    }

    /// Log the error and its chain of causes.
    pub fn log(&self) {
        event!(Level::ERROR, "{}", self.to_string());
        let mut current = self.source();
        while let Some(source) = current {
            event!(Level::ERROR, "Caused by: {}", source.to_string());
            current = source.source();
        }
    }
}

/// Body of an error report
///
/// Implements serde (de)serialise.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Main error message
    pub message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    pub fn new<E>(error: &E) -> Self
    where
        E: std::error::Error,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// An error report, as written to the output stream.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Whether the error halted the dashboard
    pub fatal: bool,

    /// Report body
    pub error: ErrorBody,
}

impl From<&DashboardError> for ErrorReport {
    fn from(error: &DashboardError) -> Self {
        ErrorReport {
            fatal: error.is_fatal(),
            error: ErrorBody::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dashboard_error(
        error: DashboardError,
        fatal: bool,
        message: &str,
        caused_by: Option<Vec<&'static str>>,
    ) {
        let report = ErrorReport::from(&error);
        let json = serde_json::to_string(&report).unwrap();
        let report: ErrorReport = serde_json::from_str(&json).unwrap();
        assert_eq!(fatal, report.fatal);
        assert_eq!(message.to_string(), report.error.message);
        // Map Vec items from str to String
        let caused_by = caused_by.map(|cb| cb.iter().map(|s| s.to_string()).collect());
        assert_eq!(caused_by, report.error.caused_by);
    }

    #[test]
    fn io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = DashboardError::Io(io_error);
        let message = "failed to read dataset";
        let caused_by = Some(vec!["no such file"]);
        test_dashboard_error(error, false, message, caused_by);
    }

    #[test]
    fn malformed_record_error() {
        let error = DashboardError::MalformedRecord {
            line: 7,
            source: Box::new(DashboardError::NotAnInteger {
                field: "salary",
                value: "lots".to_string(),
            }),
        };
        let message = "malformed record on line 7";
        let caused_by = Some(vec!["field salary is not a non-negative integer: \"lots\""]);
        test_dashboard_error(error, false, message, caused_by);
    }

    #[test]
    fn duplicate_dimension_error() {
        let error = DashboardError::DuplicateDimension {
            name: "sex".to_string(),
        };
        test_dashboard_error(error, false, "dimension sex already exists", None);
    }

    #[test]
    fn invalid_range_error() {
        let error = DashboardError::InvalidRange {
            lo: Key::Int(5),
            hi: Key::Int(2),
        };
        let message = "range lower bound 5 must be less than upper bound 2";
        test_dashboard_error(error, false, message, None);
    }

    #[test]
    fn invalid_command_error() {
        let error = DashboardError::InvalidCommand {
            command: "frobnicate".to_string(),
            reason: "unknown command".to_string(),
        };
        let message = "invalid command \"frobnicate\": unknown command";
        test_dashboard_error(error, false, message, None);
    }

    #[test]
    fn reducer_error() {
        let error = DashboardError::Reducer {
            group: "group 2 (count)".to_string(),
            key: Key::from("Female"),
            source: ReducerError::Underflow { reducer: "count" },
        };
        let message = "reducer failed for key Female in group 2 (count)";
        let caused_by = Some(vec!["count retracted a record from an empty accumulator"]);
        test_dashboard_error(error, true, message, caused_by);
    }

    #[test]
    fn group_divergence_error() {
        let error = DashboardError::GroupDivergence {
            group: "group 0 (running_average)".to_string(),
            key: Key::from("Male"),
        };
        let message =
            "incremental aggregate for key Male in group 0 (running_average) diverges from full recompute";
        test_dashboard_error(error, true, message, None);
    }

    #[test]
    fn halted_error() {
        let error = DashboardError::Halted {
            cause: "boom".to_string(),
        };
        let message = "filter coordinator halted after fatal error: boom";
        test_dashboard_error(error, true, message, None);
    }

    #[test]
    fn too_many_dimensions_error() {
        let error = DashboardError::TooManyDimensions { limit: 64 };
        test_dashboard_error(error, false, "too many dimensions (limit 64)", None);
    }

    #[test]
    fn error_body_dedups_causes() {
        let repeated = || DashboardError::MalformedRecord {
            line: 3,
            source: Box::new(DashboardError::NotAnInteger {
                field: "salary",
                value: "x".to_string(),
            }),
        };
        let inner = DashboardError::MalformedRecord {
            line: 3,
            source: Box::new(repeated()),
        };
        let error = DashboardError::MalformedRecord {
            line: 7,
            source: Box::new(inner),
        };
        let body = ErrorBody::new(&error);
        assert_eq!("malformed record on line 7", body.message);
        assert_eq!(
            Some(vec![
                "malformed record on line 3".to_string(),
                "field salary is not a non-negative integer: \"x\"".to_string(),
            ]),
            body.caused_by
        );
    }
}
