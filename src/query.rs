//! Query operations on cleaned series.
//!
//! * [extract_range] selects a trailing window of a series, or downsamples the whole of it.
//! * [compare] groups a year of observations by month for each of several locations.

use crate::error::SeriesError;
use crate::loader;
use crate::models::{
    BucketEntry, Comparison, MonthlyBuckets, RangeSelector, Record, Series, SeriesResponse,
};
use crate::source::RecordSource;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use tracing::debug;

/// Width of a resampling interval in seconds.
pub const RESAMPLE_INTERVAL_SECS: u32 = 15 * 60;

/// Select part of a series.
///
/// Windows are relative to the most recent record of the series, not to the current time. An
/// empty series gives an empty response whatever the selector.
///
/// # Arguments
///
/// * `series`: The series to select from
/// * `range`: A trailing window, or [RangeSelector::All] to resample the whole series
pub fn extract_range(series: &Series, range: RangeSelector) -> SeriesResponse {
    match range.window_days() {
        Some(days) => trailing_window(series, Duration::days(days)).into(),
        None => resample(series),
    }
}

/// Records strictly newer than `window` before the latest record.
pub fn trailing_window(series: &Series, window: Duration) -> &[Record] {
    let Some(latest) = series.latest() else {
        return &[];
    };
    // A cutoff before the earliest representable time keeps everything.
    let Some(cutoff) = latest.timestamp.checked_sub_signed(window) else {
        return series.records();
    };
    // Records are sorted, so those in the window form a suffix.
    let start = series
        .records()
        .partition_point(|record| record.timestamp <= cutoff);
    &series.records()[start..]
}

/// Start of the resampling interval containing `timestamp`.
///
/// Intervals tile each day from midnight.
pub fn interval_start(timestamp: NaiveDateTime) -> NaiveDateTime {
    let seconds = timestamp.time().num_seconds_from_midnight();
    let floored = seconds - seconds % RESAMPLE_INTERVAL_SECS;
    // Always a valid time of day, as floored <= seconds < 86400.
    let time = NaiveTime::from_num_seconds_from_midnight_opt(floored, 0).unwrap_or_default();
    timestamp.date().and_time(time)
}

/// Downsample a series to the mean of each populated 15 minute interval.
///
/// Intervals without records produce no point.
pub fn resample(series: &Series) -> SeriesResponse {
    let mut response = SeriesResponse::default();
    let mut current: Option<(NaiveDateTime, f64, usize)> = None;
    for record in series.records() {
        let start = interval_start(record.timestamp);
        current = match current {
            Some((interval, sum, count)) if interval == start => {
                Some((interval, sum + record.value, count + 1))
            }
            Some((interval, sum, count)) => {
                response.push(interval, sum / count as f64);
                Some((start, record.value, 1))
            }
            None => Some((start, record.value, 1)),
        };
    }
    if let Some((interval, sum, count)) = current {
        response.push(interval, sum / count as f64);
    }
    debug!(
        records = series.len(),
        intervals = response.len(),
        "resampled series"
    );
    response
}

/// Group the records of one calendar year by month of year.
///
/// Within a month, entries keep the chronological order of the series.
pub fn bucket_by_month(series: &Series, year: i32) -> MonthlyBuckets {
    let mut buckets = MonthlyBuckets::default();
    for record in series
        .records()
        .iter()
        .filter(|record| record.timestamp.year() == year)
    {
        buckets.push(record.timestamp.month(), BucketEntry::from(record));
    }
    buckets
}

/// Compare a chemical across locations for one year.
///
/// Locations are processed in order and each is loaded once; a repeated location appears once
/// in the result. The first location that fails to load fails the whole comparison.
///
/// # Arguments
///
/// * `source`: Source of measurement logs
/// * `locations`: Locations to compare
/// * `chemical`: Chemical identifier
/// * `year`: Calendar year
#[tracing::instrument(level = "DEBUG", skip(source))]
pub fn compare(
    source: &dyn RecordSource,
    locations: &[String],
    chemical: &str,
    year: i32,
) -> Result<Comparison, SeriesError> {
    let mut comparison = Comparison::default();
    for location in locations {
        if comparison.contains(location) {
            continue;
        }
        let series = loader::load(source, location, chemical)?;
        let buckets = bucket_by_month(&series, year);
        debug!(%location, entries = buckets.len(), "bucketed series");
        comparison.insert(location.clone(), buckets);
    }
    Ok(comparison)
}
