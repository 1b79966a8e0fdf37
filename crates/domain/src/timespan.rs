use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;

/// An inclusive absolute-time window `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpan {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSpan {
    pub fn create(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidTimeSpanError> {
        if end < start {
            Err(InvalidTimeSpanError(start, end))
        } else {
            Ok(Self { start, end })
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

#[derive(Debug)]
pub struct InvalidTimeSpanError(pub DateTime<Utc>, pub DateTime<Utc>);

impl Error for InvalidTimeSpanError {}

impl std::fmt::Display for InvalidTimeSpanError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Provided timespan start: {} and end: {} is invalid. The end cannot come before the start.",
            self.0, self.1
        )
    }
}
