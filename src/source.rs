//! Measurement log sources.
//!
//! A source resolves a (location, chemical) pair to the raw rows of its measurement log.

use crate::error::SeriesError;
use crate::metrics::SOURCE_LOADS;
use crate::models::RawRecord;

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::debug;

/// Columns a measurement log must have.
pub const REQUIRED_COLUMNS: [&str; 3] = ["datetime_EST", "vertical_amount", "quality"];

/// Source of raw measurement records.
///
/// Implementations must be safe to call concurrently; sources are read-only.
pub trait RecordSource: Send + Sync {
    /// Fetch the raw records for a (location, chemical) pair, in log order.
    ///
    /// # Arguments
    ///
    /// * `location`: Monitoring location identifier
    /// * `chemical`: Chemical identifier
    fn fetch(&self, location: &str, chemical: &str) -> Result<Vec<RawRecord>, SeriesError>;
}

/// A directory of CSV measurement logs named `{chemical}_{location}.csv`.
#[derive(Debug)]
pub struct CsvDirectorySource {
    root: PathBuf,
}

impl CsvDirectorySource {
    /// Return a new source reading logs from `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Path of the log for a (location, chemical) pair, if the identifiers can name a file in
    /// the root directory.
    pub fn log_path(&self, location: &str, chemical: &str) -> Option<PathBuf> {
        if !is_plain_identifier(location) || !is_plain_identifier(chemical) {
            return None;
        }
        Some(self.root.join(format!("{chemical}_{location}.csv")))
    }

    fn open(&self, location: &str, chemical: &str) -> Result<(PathBuf, File), SeriesError> {
        let unavailable = || SeriesError::DataUnavailable {
            location: location.to_string(),
            chemical: chemical.to_string(),
        };
        let path = self.log_path(location, chemical).ok_or_else(unavailable)?;
        match File::open(&path) {
            Ok(file) => Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(unavailable()),
            Err(source) => Err(SeriesError::SourceIo { path, source }),
        }
    }
}

impl RecordSource for CsvDirectorySource {
    #[tracing::instrument(level = "DEBUG", skip(self))]
    fn fetch(&self, location: &str, chemical: &str) -> Result<Vec<RawRecord>, SeriesError> {
        let result = self
            .open(location, chemical)
            .and_then(|(path, file)| read_records(&path, file));
        SOURCE_LOADS
            .with_label_values(&[load_outcome(&result)])
            .inc();
        result
    }
}

/// Metric label for the outcome of a load.
fn load_outcome<T>(result: &Result<T, SeriesError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(SeriesError::DataUnavailable { .. }) => "not_found",
        Err(SeriesError::Csv { .. }) | Err(SeriesError::MalformedSource { .. }) => "malformed",
        Err(_) => "error",
    }
}

/// Identifiers are used in file names and must not escape the data directory.
fn is_plain_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier != "."
        && identifier != ".."
        && !identifier.contains(['/', '\\', '\0'])
}

/// Read a CSV measurement log.
///
/// The header row must name the [REQUIRED_COLUMNS]; other columns are ignored. Short rows, such
/// as a partially written last line, are read with their missing cells empty. Rows with more
/// fields than the header are rejected.
///
/// # Arguments
///
/// * `path`: Path of the log, used in errors
/// * `reader`: Log contents
pub fn read_records<R: Read>(path: &Path, reader: R) -> Result<Vec<RawRecord>, SeriesError> {
    let csv_error = |source| SeriesError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(SeriesError::MalformedSource {
                path: path.to_path_buf(),
                reason: format!("missing column {column}"),
            });
        }
    }
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        if row.len() > headers.len() {
            let line = row.position().map_or(0, |position| position.line());
            return Err(SeriesError::MalformedSource {
                path: path.to_path_buf(),
                reason: format!(
                    "line {line} has {} fields but the header has {}",
                    row.len(),
                    headers.len()
                ),
            });
        }
        records.push(row.deserialize(Some(&headers)).map_err(csv_error)?);
    }
    debug!(path = %path.display(), rows = records.len(), "read measurement log");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    const LOG: &str = "\
,datetime_EST,vertical_amount,quality
0,2024-01-01 00:00:00,5.0,high quality na
1,2024-01-01 00:10:00,,high quality na
2,not a date,3.0,low quality na
3,2024-01-01 00:20:00,n/a,
";

    #[test]
    fn test_read_records() {
        let records = read_records(Path::new("log.csv"), LOG.as_bytes()).unwrap();
        assert_eq!(4, records.len());
        assert_eq!(
            RawRecord {
                timestamp: Some("2024-01-01 00:00:00".to_string()),
                value: Some(5.0),
                quality: Some("high quality na".to_string()),
            },
            records[0]
        );
        assert_eq!(None, records[1].value);
        assert_eq!(Some("not a date".to_string()), records[2].timestamp);
        // Non-numeric values and empty flags are missing.
        assert_eq!(None, records[3].value);
        assert_eq!(None, records[3].quality);
    }

    #[test]
    fn test_read_records_named_index_column() {
        let log = "Unnamed: 0,quality,vertical_amount,datetime_EST,extra\n\
                   7,high quality na,1.5,2024-02-01 00:00:00,x\n";
        let records = read_records(Path::new("log.csv"), log.as_bytes()).unwrap();
        assert_eq!(1, records.len());
        assert_eq!(Some(1.5), records[0].value);
    }

    #[test]
    fn test_read_records_header_only() {
        let log = "datetime_EST,vertical_amount,quality\n";
        let records = read_records(Path::new("log.csv"), log.as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_records_missing_column() {
        let log = "datetime_EST,vertical_amount\n2024-01-01 00:00:00,1.0\n";
        let error = read_records(Path::new("log.csv"), log.as_bytes()).unwrap_err();
        assert_eq!(
            "measurement log log.csv is malformed: missing column quality",
            error.to_string()
        );
    }

    #[test]
    fn test_read_records_empty_file() {
        let error = read_records(Path::new("log.csv"), "".as_bytes()).unwrap_err();
        assert!(matches!(error, SeriesError::MalformedSource { .. }));
    }

    #[test]
    fn test_read_records_short_row() {
        let log = "datetime_EST,vertical_amount,quality\n\
                   2024-01-01 00:00:00,1.0,high quality na\n\
                   2024-01-01 00:10:00,2.0\n";
        let records = read_records(Path::new("log.csv"), log.as_bytes()).unwrap();
        assert_eq!(2, records.len());
        assert_eq!(Some(1.0), records[0].value);
        assert_eq!(Some(2.0), records[1].value);
        assert_eq!(None, records[1].quality);
        // The short row is dropped when cleaned.
        assert_eq!(1, crate::loader::clean(&records).len());
    }

    #[test]
    fn test_read_records_long_row() {
        let log = "datetime_EST,vertical_amount,quality\n\
                   2024-01-01 00:00:00,1.0,high quality na,extra\n";
        let error = read_records(Path::new("log.csv"), log.as_bytes()).unwrap_err();
        assert_eq!(
            "measurement log log.csv is malformed: line 2 has 4 fields but the header has 3",
            error.to_string()
        );
    }

    #[test]
    fn test_log_path() {
        let source = CsvDirectorySource::new("/data");
        assert_eq!(
            Some(PathBuf::from("/data/HCHO_Mcmillan.csv")),
            source.log_path("Mcmillan", "HCHO")
        );
        assert_eq!(None, source.log_path("../etc", "HCHO"));
        assert_eq!(None, source.log_path("Mcmillan", ""));
        assert_eq!(None, source.log_path("..", "HCHO"));
    }

    #[test]
    fn test_fetch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("HCHO_Mcmillan.csv"), LOG).unwrap();
        let source = CsvDirectorySource::new(dir.path());
        let records = source.fetch("Mcmillan", "HCHO").unwrap();
        assert_eq!(4, records.len());
    }

    #[test]
    fn test_fetch_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvDirectorySource::new(dir.path());
        let error = source.fetch("Mcmillan", "NO2").unwrap_err();
        assert!(matches!(
            error,
            SeriesError::DataUnavailable { ref location, ref chemical }
                if location == "Mcmillan" && chemical == "NO2"
        ));
        let error = source.fetch("../Mcmillan", "NO2").unwrap_err();
        assert!(matches!(error, SeriesError::DataUnavailable { .. }));
    }

    #[test]
    fn test_load_outcome() {
        let ok: Result<(), SeriesError> = Ok(());
        assert_eq!("ok", load_outcome(&ok));
        let not_found: Result<(), SeriesError> = Err(SeriesError::DataUnavailable {
            location: "a".to_string(),
            chemical: "b".to_string(),
        });
        assert_eq!("not_found", load_outcome(&not_found));
        let malformed: Result<(), SeriesError> = Err(SeriesError::MalformedSource {
            path: "a".into(),
            reason: "b".to_string(),
        });
        assert_eq!("malformed", load_outcome(&malformed));
    }
}
