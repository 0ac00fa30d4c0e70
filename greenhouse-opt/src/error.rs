use chrono::NaiveDateTime;
use greenhouse_model::ParameterError;
use thiserror::Error;

/// Problems with input or derived data files.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid timestamp `{0}`, expected YYYYMMDDHH")]
    InvalidTimestamp(String),
    #[error("series `{name}` contains {timestamp} more than once")]
    DuplicateTimestamp {
        name: String,
        timestamp: NaiveDateTime,
    },
    #[error("column `{column}` not found in {path}")]
    MissingColumn { path: String, column: String },
    #[error("no header row containing `{column}` found in {path}")]
    HeaderNotFound { path: String, column: String },
    #[error("series have no common timestamps")]
    EmptyIntersection,
    #[error("{path} contains no data")]
    Empty { path: String },
}

/// Errors raised while building or solving an energy network.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("network has no snapshots")]
    EmptySnapshots,
    #[error("{component} `{name}` refers to unknown bus `{bus}`")]
    UnknownBus {
        component: &'static str,
        name: String,
        bus: String,
    },
    #[error("{component} `{name}` already exists")]
    Duplicate {
        component: &'static str,
        name: String,
    },
    #[error("{component} `{name}`: {field} has {actual} values, expected {expected}")]
    ProfileLength {
        component: &'static str,
        name: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{component} `{name}`: {source}")]
    InvalidParameter {
        component: &'static str,
        name: String,
        #[source]
        source: ParameterError,
    },
    #[error("{component} `{name}`: {field} contains a non-finite or negative value")]
    InvalidValue {
        component: &'static str,
        name: String,
        field: &'static str,
    },
    #[error("input series `{0}` is missing")]
    MissingSeries(&'static str),
    #[error("component `{0}` not found in solution")]
    UnknownComponent(String),
    #[error("optimization failed: {0}")]
    Solve(String),
}
