//! Data types and associated functions and methods

use crate::error::SeriesError;
use crate::validated_query::FromQueryPairs;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use strum_macros::Display;
use tracing::debug;
use validator::{Validate, ValidationError};

/// Layout of timestamps in API responses, e.g. `2024-01-01 00:10:00`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The only quality flag accepted from a measurement log.
pub const ACCEPTED_QUALITY: &str = "high quality na";

/// Number of buckets in a [MonthlyBuckets].
pub const MONTHS_PER_YEAR: usize = 12;

/// One row of a measurement log, as read from the source.
///
/// Cells that are empty or cannot be interpreted are `None`. Columns other than these three,
/// such as the legacy `Unnamed: 0` row index, are ignored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawRecord {
    /// Local (EST-labelled) timestamp, unparsed
    #[serde(rename = "datetime_EST", default)]
    pub timestamp: Option<String>,
    /// Measured vertical column amount
    #[serde(
        rename = "vertical_amount",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub value: Option<f64>,
    /// Quality flag
    #[serde(default)]
    pub quality: Option<String>,
}

/// A cleaned measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Record {
    /// Return a new Record.
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Record { timestamp, value }
    }

    /// Timestamp formatted for API responses.
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(DATETIME_FORMAT).to_string()
    }
}

/// Chronologically ordered measurements for one (location, chemical) pair.
///
/// Records are sorted by timestamp on construction. The sort is stable, so records sharing a
/// timestamp keep their source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    records: Vec<Record>,
}

impl Series {
    /// Return a new Series from records in any order.
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|record| record.timestamp);
        Series { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Option<&Record> {
        self.records.last()
    }
}

/// Selection of a trailing time window, or of the whole downsampled series.
///
/// Parsing never fails: anything that is not a known window selects [RangeSelector::All].
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, PartialEq, Eq)]
#[serde(from = "String")]
pub enum RangeSelector {
    /// Last three days
    #[strum(serialize = "3d")]
    ThreeDays,
    /// Last seven days
    #[strum(serialize = "7d")]
    SevenDays,
    /// Last thirty days
    #[strum(serialize = "1m")]
    OneMonth,
    /// Whole series, resampled
    #[default]
    #[strum(serialize = "all")]
    All,
}

impl RangeSelector {
    /// Length of the trailing window in days, or `None` for the whole series.
    pub fn window_days(self) -> Option<i64> {
        match self {
            Self::ThreeDays => Some(3),
            Self::SevenDays => Some(7),
            Self::OneMonth => Some(30),
            Self::All => None,
        }
    }
}

impl From<&str> for RangeSelector {
    fn from(value: &str) -> Self {
        match value {
            "3d" => Self::ThreeDays,
            "7d" => Self::SevenDays,
            "1m" => Self::OneMonth,
            "all" => Self::All,
            other => {
                debug!(range = other, "unrecognised range selector, using all");
                Self::All
            }
        }
    }
}

impl From<String> for RangeSelector {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

/// Query parameters for the series endpoint
#[derive(Debug, Default, PartialEq, Validate)]
pub struct DataParams {
    /// Time range to return
    pub range: RangeSelector,
    /// Monitoring location, or the configured default
    #[validate(length(min = 1, message = "location must not be empty"))]
    pub location: Option<String>,
    /// Chemical, or the configured default
    #[validate(length(min = 1, message = "chemical must not be empty"))]
    pub chemical: Option<String>,
}

impl FromQueryPairs for DataParams {
    fn from_query_pairs(pairs: Vec<(String, String)>) -> Result<Self, SeriesError> {
        let mut params = DataParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "range" => params.range = RangeSelector::from(value),
                "location" => params.location = Some(value),
                "chemical" => params.chemical = Some(value),
                _ => (),
            }
        }
        Ok(params)
    }
}

/// Query parameters for the comparison endpoint
#[derive(Debug, Default, PartialEq, Validate)]
pub struct CompareParams {
    /// Locations to compare, in response order
    #[validate(
        length(min = 1, message = "at least one location must be given"),
        custom = "validate_identifiers"
    )]
    pub locations: Vec<String>,
    /// Chemical, or the configured default
    #[validate(length(min = 1, message = "chemical must not be empty"))]
    pub chemical: Option<String>,
    /// Calendar year, or the current year
    pub year: Option<i32>,
}

impl FromQueryPairs for CompareParams {
    fn from_query_pairs(pairs: Vec<(String, String)>) -> Result<Self, SeriesError> {
        let mut params = CompareParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "locations" => params.locations.push(value),
                "chemical" => params.chemical = Some(value),
                "year" => {
                    let year = value.trim().parse::<i32>().map_err(|_| {
                        SeriesError::InvalidQueryParameter {
                            name: "year",
                            value,
                        }
                    })?;
                    params.year = Some(year);
                }
                _ => (),
            }
        }
        Ok(params)
    }
}

/// Validate a list of location identifiers
fn validate_identifiers(identifiers: &[String]) -> Result<(), ValidationError> {
    if identifiers.iter().any(|identifier| identifier.is_empty()) {
        return Err(ValidationError::new("locations must not be empty"));
    }
    Ok(())
}

/// Response of the series endpoint: two aligned sequences.
#[derive(Debug, Default, Deserialize, PartialEq, serde::Serialize)]
pub struct SeriesResponse {
    /// Formatted timestamps
    pub datetime: Vec<String>,
    /// Values, one per timestamp
    pub vertical_amount: Vec<f64>,
}

impl SeriesResponse {
    /// Append a point.
    pub fn push(&mut self, timestamp: NaiveDateTime, value: f64) {
        self.datetime
            .push(timestamp.format(DATETIME_FORMAT).to_string());
        self.vertical_amount.push(value);
    }

    pub fn len(&self) -> usize {
        self.datetime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datetime.is_empty()
    }
}

impl From<&[Record]> for SeriesResponse {
    fn from(records: &[Record]) -> Self {
        let mut response = SeriesResponse::default();
        for record in records {
            response.push(record.timestamp, record.value);
        }
        response
    }
}

/// One observation within a month bucket.
#[derive(Clone, Debug, Deserialize, PartialEq, serde::Serialize)]
pub struct BucketEntry {
    pub vertical_amount: f64,
    /// Original timestamp, formatted
    pub date: String,
}

impl From<&Record> for BucketEntry {
    fn from(record: &Record) -> Self {
        BucketEntry {
            vertical_amount: record.value,
            date: record.formatted_timestamp(),
        }
    }
}

/// Observations of one year grouped by month of year.
///
/// All twelve months are always present; months without data are empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonthlyBuckets {
    months: [Vec<BucketEntry>; MONTHS_PER_YEAR],
}

impl MonthlyBuckets {
    /// Append an entry to the bucket for `month` (1 to 12).
    ///
    /// # Panics
    ///
    /// Panics if `month` is not in 1 to 12.
    pub fn push(&mut self, month: u32, entry: BucketEntry) {
        self.months[Self::index(month)].push(entry);
    }

    /// Entries for `month` (1 to 12).
    ///
    /// # Panics
    ///
    /// Panics if `month` is not in 1 to 12.
    pub fn month(&self, month: u32) -> &[BucketEntry] {
        &self.months[Self::index(month)]
    }

    /// Iterate over `(month, entries)` for months 1 to 12.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[BucketEntry])> {
        (1u32..).zip(self.months.iter().map(Vec::as_slice))
    }

    /// Total number of entries across all months.
    pub fn len(&self) -> usize {
        self.months.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(month: u32) -> usize {
        assert!(
            (1..=MONTHS_PER_YEAR as u32).contains(&month),
            "month {month} out of range"
        );
        month as usize - 1
    }
}

impl Serialize for MonthlyBuckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MONTHS_PER_YEAR))?;
        for (month, entries) in self.iter() {
            map.serialize_entry(&month, entries)?;
        }
        map.end()
    }
}

/// Monthly buckets per location, in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comparison {
    locations: Vec<(String, MonthlyBuckets)>,
}

impl Comparison {
    /// Whether `location` is already present.
    pub fn contains(&self, location: &str) -> bool {
        self.get(location).is_some()
    }

    /// Append the buckets of a location not yet present.
    pub fn insert(&mut self, location: String, buckets: MonthlyBuckets) {
        debug_assert!(!self.contains(&location), "duplicate location {location}");
        self.locations.push((location, buckets));
    }

    pub fn get(&self, location: &str) -> Option<&MonthlyBuckets> {
        self.locations
            .iter()
            .find(|(name, _)| name == location)
            .map(|(_, buckets)| buckets)
    }

    /// Location names in request order.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Serialize for Comparison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.locations.len()))?;
        for (location, buckets) in &self.locations {
            map.serialize_entry(location, buckets)?;
        }
        map.end()
    }
}
