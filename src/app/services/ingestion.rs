//! Daily-file row ingestion and column reconciliation
//!
//! Reads every per-day file of one station in filename order, validates each
//! row against the corrupt-line marker and the strict UTC timestamp pattern,
//! and merges accepted rows into the column-oriented dataset while keeping
//! all columns index-aligned with the time axis.

use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::app::models::StationDataset;
use crate::app::services::schema_discovery::StationSchema;
use crate::constants::{CORRUPT_LINE_MARKER, LOCAL_TIME_FIELD, UTC_TIMESTAMP_FORMAT};
use crate::{Error, Result};

/// Counters accumulated while ingesting one station
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Daily files read to completion
    pub files_read: usize,
    /// Rows accepted into the dataset
    pub rows_accepted: usize,
    /// Rows dropped for a corrupt marker, a bad timestamp, or a parse error
    pub rows_rejected: usize,
}

/// Ingest all daily files of one station into a fresh dataset.
///
/// `time_field` must be the discovered UTC timestamp field; rows are
/// validated against it. Individual unreadable files are logged and skipped,
/// never fatal for the station.
pub fn ingest(
    station_id: &str,
    time_field: &str,
    schema: &StationSchema,
) -> Result<(StationDataset, IngestStats)> {
    let mut dataset = StationDataset::new(station_id, time_field, &schema.field_names);
    let mut stats = IngestStats::default();

    for file in &schema.files {
        match ingest_file(file, &mut dataset, &mut stats) {
            Ok(()) => stats.files_read += 1,
            Err(e) => warn!("Skipping daily file {}: {}", file.display(), e),
        }
    }

    dataset.align_columns();

    info!(
        "Ingested {} rows from {} files for {} ({} rejected)",
        stats.rows_accepted, stats.files_read, station_id, stats.rows_rejected
    );

    Ok((dataset, stats))
}

/// Ingest one daily file, appending accepted rows to the dataset
fn ingest_file(path: &Path, dataset: &mut StationDataset, stats: &mut IngestStats) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            Error::csv_parsing(
                path.display().to_string(),
                "failed to open daily file",
                Some(e),
            )
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| {
            Error::csv_parsing(
                path.display().to_string(),
                "failed to read header row",
                Some(e),
            )
        })?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let Some(time_index) = headers.iter().position(|name| name == dataset.time_field()) else {
        warn!(
            "Daily file {} lacks the {} field and contributes no rows",
            path.display(),
            dataset.time_field()
        );
        return Ok(());
    };
    let local_time_index = headers.iter().position(|name| name == LOCAL_TIME_FIELD);

    // First occurrence wins when a header name repeats within one file
    let mut field_indices: Vec<(String, usize)> = Vec::with_capacity(headers.len());
    for (index, name) in headers.iter().enumerate() {
        if !field_indices.iter().any(|(seen, _)| seen == name) {
            field_indices.push((name.clone(), index));
        }
    }

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                stats.rows_rejected += 1;
                debug!("Dropping unreadable row in {}: {}", path.display(), e);
                continue;
            }
        };

        // Non-data lines carry the corrupt marker in the local time field
        if let Some(index) = local_time_index {
            if record.get(index).map(str::trim) == Some(CORRUPT_LINE_MARKER) {
                stats.rows_rejected += 1;
                continue;
            }
        }

        let raw_timestamp = record.get(time_index).unwrap_or("").trim();
        let timestamp = match NaiveDateTime::parse_from_str(raw_timestamp, UTC_TIMESTAMP_FORMAT) {
            Ok(timestamp) => timestamp,
            Err(_) => {
                stats.rows_rejected += 1;
                continue;
            }
        };

        dataset.append_row(
            timestamp,
            field_indices.iter().filter_map(|(name, index)| {
                record.get(*index).map(|value| (name.as_str(), value))
            }),
        );
        stats.rows_accepted += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::CellValue;
    use crate::app::services::schema_discovery;
    use std::fs;
    use tempfile::tempdir;

    fn discover_and_ingest(dir: &Path) -> (StationDataset, IngestStats) {
        let schema = schema_discovery::discover(dir).unwrap();
        let time_field = schema.utc_time_field().unwrap().to_string();
        ingest("ITEST1", &time_field, &schema).unwrap()
    }

    #[test]
    fn corrupt_marker_and_bad_timestamp_rows_are_dropped() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ITEST1_20140101.txt"),
            "Time,TemperatureC,DateUTC\n\
             2014-01-01 01:05:00,3.2,2014-01-01 00:05:00\n\
             <br>\n\
             2014-01-01 01:10:00,3.3,not-a-timestamp\n\
             2014-01-01 01:15:00,3.4,2014-01-01 00:15:00\n",
        )
        .unwrap();

        let (dataset, stats) = discover_and_ingest(dir.path());
        assert_eq!(dataset.len(), 2);
        assert_eq!(stats.rows_accepted, 2);
        assert_eq!(stats.rows_rejected, 2);

        // Neighbouring rows keep their values, nothing shifts
        let temperature = dataset.column("TemperatureC").unwrap();
        assert_eq!(
            temperature,
            &[CellValue::Number(3.2), CellValue::Number(3.4)]
        );
    }

    #[test]
    fn columns_stay_aligned_across_files_with_different_headers() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ITEST1_20140101.txt"),
            "Time,TemperatureC,Humidity,DateUTC\n\
             2014-01-01 01:05:00,3.2,80,2014-01-01 00:05:00\n",
        )
        .unwrap();
        // Second day misses the Humidity column and adds Conditions
        fs::write(
            dir.path().join("ITEST1_20140102.txt"),
            "Time,TemperatureC,Conditions,DateUTC\n\
             2014-01-02 01:05:00,4.1,Rain,2014-01-02 00:05:00\n",
        )
        .unwrap();

        let (dataset, _) = discover_and_ingest(dir.path());
        assert_eq!(dataset.len(), 2);
        for name in dataset.field_order() {
            assert_eq!(
                dataset.column(name).unwrap().len(),
                dataset.len(),
                "column {name} lost alignment"
            );
        }
        let humidity = dataset.column("Humidity").unwrap();
        assert_eq!(humidity, &[CellValue::Number(80.0), CellValue::empty()]);
    }

    #[test]
    fn columns_outside_the_schema_are_ignored() {
        let dir = tempdir().unwrap();
        // Schema comes from the first file with data; the extra column of the
        // second file is not part of it
        fs::write(
            dir.path().join("ITEST1_20140101.txt"),
            "Time,TemperatureC,DateUTC\n\
             2014-01-01 01:05:00,3.2,2014-01-01 00:05:00\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("ITEST1_20140102.txt"),
            "Time,TemperatureC,Extra,DateUTC\n\
             2014-01-02 01:05:00,4.1,9.9,2014-01-02 00:05:00\n",
        )
        .unwrap();

        let (dataset, _) = discover_and_ingest(dir.path());
        assert!(dataset.column("Extra").is_none());
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn file_without_the_time_field_contributes_no_rows() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ITEST1_20140101.txt"),
            "Time,TemperatureC,DateUTC\n\
             2014-01-01 01:05:00,3.2,2014-01-01 00:05:00\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("ITEST1_20140102.txt"),
            "Time,TemperatureC\n\
             2014-01-02 01:05:00,4.1\n",
        )
        .unwrap();

        let (dataset, stats) = discover_and_ingest(dir.path());
        assert_eq!(dataset.len(), 1);
        assert_eq!(stats.rows_accepted, 1);
    }

    #[test]
    fn header_only_files_yield_an_empty_dataset() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ITEST1_20140101.txt"),
            "Time,TemperatureC,DateUTC\n",
        )
        .unwrap();

        let (dataset, stats) = discover_and_ingest(dir.path());
        assert!(dataset.is_empty());
        assert_eq!(stats.rows_accepted, 0);
    }
}
