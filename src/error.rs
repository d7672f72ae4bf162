use std::collections::TryReserveError;
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    /// A numeric field left [0, 1]. Nothing was stored.
    #[error("{field} = {value} is outside [0, 1]")]
    OutOfRange { field: String, value: f64 },

    /// Outside the range a calendar time can be derived from.
    #[error("timestamp {0} ms is not a representable point in time")]
    InvalidTimestamp(i64),

    #[error("timestamp {timestamp} precedes the latest observation at {latest}")]
    OutOfOrder { latest: i64, timestamp: i64 },

    /// The store could not grow. Ends the session.
    #[error("emotion series could not grow: {0}")]
    Exhausted(#[from] TryReserveError),
}

impl SeriesError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SeriesError::Exhausted(_))
    }
}

#[derive(Debug, Error)]
#[error("unknown emotion label `{0}`")]
pub struct UnknownEmotion(pub String);

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("export serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of milliseconds, got `{value}`")]
    InvalidMillis {
        key: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{key} must be greater than zero")]
    ZeroDuration { key: &'static str },
}
