//! Field-name discovery through daily-file header analysis
//!
//! This module determines the authoritative field set for one station by
//! scanning its per-day files in filename order and reading headers until a
//! file with actual data rows is found.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::app::adapters::filesystem;
use crate::constants::UTC_FIELD_MARKER;
use crate::{Error, Result};

/// Schema information discovered from daily-file headers
#[derive(Debug, Clone)]
pub struct StationSchema {
    /// Field names from the sampled header, in header order
    pub field_names: Vec<String>,
    /// All daily files of the station, sorted lexicographically by filename
    /// (chronological by the naming convention)
    pub files: Vec<PathBuf>,
    /// The file whose header was taken as authoritative
    pub sampled_from: Option<PathBuf>,
}

impl StationSchema {
    /// The UTC timestamp field, if the discovered set has one
    pub fn utc_time_field(&self) -> Option<&str> {
        self.field_names
            .iter()
            .find(|name| name.contains(UTC_FIELD_MARKER))
            .map(String::as_str)
    }

    /// Whether any field names were discovered at all
    pub fn has_fields(&self) -> bool {
        self.field_names.iter().any(|name| !name.is_empty())
    }

    /// Summary for logging
    pub fn summary(&self) -> String {
        format!(
            "{} fields from {} daily files",
            self.field_names.len(),
            self.files.len()
        )
    }
}

/// Discover the field set for one station directory.
///
/// Headers are read file by file in filename order; the first file that also
/// contains a data row is authoritative. If every file is header-only, the
/// last seen header stands and downstream reports nothing to process.
///
/// Fails with a no-input error when the directory holds no daily files.
pub fn discover(station_dir: &Path) -> Result<StationSchema> {
    let files = filesystem::daily_files(station_dir)?;
    if files.is_empty() {
        return Err(Error::no_input_files(station_dir.display().to_string()));
    }

    info!(
        "Discovering field names from {} daily files in {}",
        files.len(),
        station_dir.display()
    );

    let mut field_names: Vec<String> = Vec::new();
    let mut sampled_from = None;

    for file in &files {
        match read_header(file) {
            Ok((headers, has_data)) => {
                if headers.iter().any(|name| !name.is_empty()) {
                    field_names = headers;
                    sampled_from = Some(file.clone());
                    if has_data {
                        // First file with real rows settles the field set
                        break;
                    }
                }
            }
            Err(e) => {
                warn!("Skipping unreadable daily file {}: {}", file.display(), e);
            }
        }
    }

    // Duplicate header names collapse onto their first occurrence
    let mut unique_names: Vec<String> = Vec::with_capacity(field_names.len());
    for name in field_names {
        if !unique_names.contains(&name) {
            unique_names.push(name);
        }
    }

    let schema = StationSchema {
        field_names: unique_names,
        files,
        sampled_from,
    };
    debug!("Schema discovery complete: {}", schema.summary());

    Ok(schema)
}

/// Read the header of one daily file and check whether it has any data row
fn read_header(path: &Path) -> Result<(Vec<String>, bool)> {
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

    let has_data = matches!(reader.records().next(), Some(Ok(_)));

    Ok((headers, has_data))
}
