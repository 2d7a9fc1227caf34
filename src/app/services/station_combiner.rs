//! Per-station pipeline orchestration
//!
//! Runs schema discovery, ingestion, chronological ordering, and NetCDF
//! serialization start-to-finish for one station, and drives multi-station
//! batches in which one station's failure never aborts its siblings.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::app::adapters::filesystem;
use crate::app::services::netcdf_writer::NetcdfWriter;
use crate::app::services::{ingestion, schema_discovery};
use crate::config::CombineConfig;
use crate::constants::UTC_FIELD_MARKER;
use crate::Result;

/// Why a station produced no output despite valid input files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The discovered field set has no UTC timestamp field
    NoUtcTimeField,
    /// Every daily file was header-only
    NoDataRows,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoUtcTimeField => write!(f, "no {UTC_FIELD_MARKER} field discovered"),
            SkipReason::NoDataRows => write!(f, "no data rows in any daily file"),
        }
    }
}

/// Result of one station's combine run
#[derive(Debug, Clone, PartialEq)]
pub enum CombineOutcome {
    /// A fresh container was written
    Written {
        path: PathBuf,
        rows: usize,
        variables: usize,
    },
    /// An existing non-empty container was left untouched
    SkippedUpToDate { path: PathBuf },
    /// Input was readable but yielded nothing to serialize
    NothingToWrite { reason: SkipReason },
}

/// Counters for a multi-station batch run
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub stations: usize,
    pub written: usize,
    pub up_to_date: usize,
    pub nothing_to_write: usize,
    pub failed: usize,
}

/// Combiner for one input root (a station directory or a directory of them)
pub struct StationCombiner {
    config: CombineConfig,
}

impl StationCombiner {
    /// Create a combiner from a validated configuration
    pub fn new(config: CombineConfig) -> Self {
        Self { config }
    }

    /// Configuration this combiner runs with
    pub fn config(&self) -> &CombineConfig {
        &self.config
    }

    /// Run the full pipeline for a single station directory
    pub fn combine_station(&self, station_dir: &Path) -> Result<CombineOutcome> {
        let station_id = filesystem::station_id(station_dir);
        let output_path = filesystem::output_path(&self.config.output_dir, &station_id);

        if filesystem::is_complete(&output_path) {
            info!(
                "Please remove existing NetCDF file before recreating: {}",
                output_path.display()
            );
            return Ok(CombineOutcome::SkippedUpToDate { path: output_path });
        }

        info!("Processing {}", station_dir.display());

        let schema = schema_discovery::discover(station_dir)?;
        let Some(time_field) = schema.utc_time_field().map(str::to_string) else {
            warn!(
                "Nothing to write for {}: {}",
                output_path.display(),
                SkipReason::NoUtcTimeField
            );
            return Ok(CombineOutcome::NothingToWrite {
                reason: SkipReason::NoUtcTimeField,
            });
        };

        let (mut dataset, _stats) = ingestion::ingest(&station_id, &time_field, &schema)?;
        if dataset.is_empty() {
            warn!(
                "Nothing to write for {}: {}",
                output_path.display(),
                SkipReason::NoDataRows
            );
            return Ok(CombineOutcome::NothingToWrite {
                reason: SkipReason::NoDataRows,
            });
        }

        dataset.sort_chronologically();

        let writer = NetcdfWriter::new(&output_path, self.config.position(), station_dir);
        let write_stats = writer.write(&dataset)?;

        Ok(CombineOutcome::Written {
            path: output_path,
            rows: write_stats.rows,
            variables: write_stats.variables(),
        })
    }

    /// Run every station below the configured input root.
    ///
    /// Per-station failures are logged and counted; sibling stations always
    /// keep processing.
    pub fn combine_all(&self, show_progress: bool) -> Result<BatchStats> {
        let station_dirs = filesystem::station_dirs(&self.config.input_dir)?;

        let progress = if show_progress {
            let bar = ProgressBar::new(station_dirs.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(bar)
        } else {
            None
        };

        let mut stats = BatchStats {
            stations: station_dirs.len(),
            ..BatchStats::default()
        };

        for station_dir in &station_dirs {
            if let Some(bar) = &progress {
                bar.set_message(filesystem::station_id(station_dir));
            }
            match self.combine_station(station_dir) {
                Ok(CombineOutcome::Written { path, rows, .. }) => {
                    info!("Combined {} rows into {}", rows, path.display());
                    stats.written += 1;
                }
                Ok(CombineOutcome::SkippedUpToDate { .. }) => stats.up_to_date += 1,
                Ok(CombineOutcome::NothingToWrite { .. }) => stats.nothing_to_write += 1,
                Err(e) => {
                    error!("Failed to process {}: {}", station_dir.display(), e);
                    stats.failed += 1;
                }
            }
            if let Some(bar) = &progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = &progress {
            bar.finish_with_message("Combine complete");
        }

        Ok(stats)
    }
}
