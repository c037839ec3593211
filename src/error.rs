use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("failed to fetch roster for class {class_name}")]
    RosterFetch {
        class_name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to fetch attendance for class {class_name}")]
    AttendanceFetch {
        class_name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to list classes")]
    ClassListFetch(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
#[error("unknown attendance status {0:?}")]
pub struct StatusParseError(pub String);
