use crate::cli::CommandLineArgs;
use crate::error::SeriesError;
use crate::models::{RawRecord, Record, DATETIME_FORMAT};
use crate::source::RecordSource;

use chrono::NaiveDateTime;
use clap::Parser;
use std::collections::HashMap;

/// Command line arguments with every option at its default.
pub(crate) fn test_args() -> CommandLineArgs {
    CommandLineArgs::try_parse_from(["pandora-series"]).unwrap()
}

/// Parse a timestamp in response format.
pub(crate) fn datetime(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).unwrap()
}

/// Create a cleaned Record.
pub(crate) fn record(timestamp: &str, value: f64) -> Record {
    Record::new(datetime(timestamp), value)
}

/// Create a RawRecord.
pub(crate) fn raw(timestamp: Option<&str>, value: Option<f64>, quality: Option<&str>) -> RawRecord {
    RawRecord {
        timestamp: timestamp.map(str::to_string),
        value,
        quality: quality.map(str::to_string),
    }
}

/// An in-memory RecordSource keyed by (location, chemical).
#[derive(Default)]
pub(crate) struct MemorySource {
    logs: HashMap<(String, String), Vec<RawRecord>>,
}

impl MemorySource {
    /// Add the log for a (location, chemical) pair.
    pub(crate) fn with_log(
        mut self,
        location: &str,
        chemical: &str,
        records: Vec<RawRecord>,
    ) -> Self {
        self.logs
            .insert((location.to_string(), chemical.to_string()), records);
        self
    }
}

impl RecordSource for MemorySource {
    fn fetch(&self, location: &str, chemical: &str) -> Result<Vec<RawRecord>, SeriesError> {
        self.logs
            .get(&(location.to_string(), chemical.to_string()))
            .cloned()
            .ok_or_else(|| SeriesError::DataUnavailable {
                location: location.to_string(),
                chemical: chemical.to_string(),
            })
    }
}
