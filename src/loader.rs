//! Loading of cleaned measurement series.
//!
//! The loader turns the raw rows of a measurement log into a [Series]: timestamps are parsed,
//! rows without the accepted quality flag are dropped, as are rows with a missing timestamp or
//! value, and the remainder is sorted chronologically.

use crate::error::SeriesError;
use crate::models::{RawRecord, Record, Series, ACCEPTED_QUALITY};
use crate::source::RecordSource;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Timestamp layouts accepted in measurement logs, tried in order.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Timestamp layout with a trailing UTC offset.
const OFFSET_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// Parse a naive local timestamp.
///
/// Returns `None` if the text matches none of the accepted layouts. A bare date is taken as
/// midnight. No timezone conversion is performed: a trailing UTC offset is dropped and the
/// wall-clock time kept.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_str(text, OFFSET_TIMESTAMP_FORMAT)
                .ok()
                .map(|timestamp| timestamp.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Convert a raw row into a cleaned record, or `None` if the row is to be dropped.
fn clean_record(raw: &RawRecord) -> Option<Record> {
    if raw.quality.as_deref() != Some(ACCEPTED_QUALITY) {
        return None;
    }
    let timestamp = raw.timestamp.as_deref().and_then(parse_timestamp)?;
    let value = raw.value.filter(|value| !value.is_nan())?;
    Some(Record::new(timestamp, value))
}

/// Build a series from raw rows.
///
/// Never fails: rows that cannot be used are dropped and the result may be empty.
pub fn clean(raw: &[RawRecord]) -> Series {
    Series::new(raw.iter().filter_map(clean_record).collect())
}

/// Load the cleaned series for a (location, chemical) pair.
///
/// # Arguments
///
/// * `source`: Source of measurement logs
/// * `location`: Monitoring location identifier
/// * `chemical`: Chemical identifier
#[tracing::instrument(level = "DEBUG", skip(source))]
pub fn load(
    source: &dyn RecordSource,
    location: &str,
    chemical: &str,
) -> Result<Series, SeriesError> {
    let raw = source.fetch(location, chemical)?;
    let series = clean(&raw);
    debug!(raw = raw.len(), retained = series.len(), "loaded series");
    Ok(series)
}
