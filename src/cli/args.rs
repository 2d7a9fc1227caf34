//! Command-line argument definitions for the Wunderground processor
//!
//! This module defines the complete CLI interface using the clap derive API:
//! a `download` command for fetching per-day station dumps and a `combine`
//! command for consolidating them into per-station NetCDF datasets.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::{DATE_STAMP_FORMAT, DEFAULT_DOWNLOAD_WORKERS};
use crate::{Error, Result};

/// CLI arguments for the Wunderground weather data processor
///
/// Downloads Weather Underground personal-weather-station history and
/// consolidates the per-day text dumps into one NetCDF dataset per station.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wunderground-processor",
    version,
    about = "Download Wunderground station history and combine it into per-station NetCDF datasets",
    long_about = "A tool that downloads historical observations of Weather Underground \
                  personal weather stations as per-day text dumps, and consolidates a \
                  station's accumulated dumps into one chronologically ordered, \
                  unit-normalized NetCDF dataset with per-variable metadata."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the Wunderground processor
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Download per-day station dumps from the Wunderground portal
    Download(DownloadArgs),
    /// Combine a station's per-day dumps into one NetCDF dataset
    Combine(CombineArgs),
}

/// Arguments for the download command
#[derive(Debug, Clone, Parser)]
pub struct DownloadArgs {
    /// Station identifier on the Wunderground portal
    ///
    /// Either this or --station-csv must be given.
    #[arg(
        short = 's',
        long = "station-id",
        value_name = "ID",
        help = "Station identifier on the Wunderground portal"
    )]
    pub station_id: Option<String>,

    /// CSV file listing stations to download
    ///
    /// The file must carry a 'Station ID' column; every listed station is
    /// downloaded in turn.
    #[arg(
        long = "station-csv",
        value_name = "FILE",
        help = "CSV file with a 'Station ID' column listing stations"
    )]
    pub station_csv: Option<PathBuf>,

    /// First day to download (YYYYMMDD)
    #[arg(
        short = 'b',
        long = "startdate",
        value_name = "YYYYMMDD",
        help = "First day to download"
    )]
    pub startdate: String,

    /// Last day to download (YYYYMMDD), inclusive
    #[arg(
        short = 'e',
        long = "enddate",
        value_name = "YYYYMMDD",
        help = "Last day to download, inclusive"
    )]
    pub enddate: String,

    /// Output directory
    ///
    /// One subdirectory per station is created below it, holding the
    /// per-day dump files.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = ".",
        help = "Output directory; one subdirectory per station"
    )]
    pub output_dir: PathBuf,

    /// Keep existing non-empty daily files instead of re-downloading them
    ///
    /// Zero-byte files always count as absent and are re-fetched, so a
    /// re-run only retries missing and failed days.
    #[arg(short = 'k', long = "keep", help = "Keep existing non-empty daily files")]
    pub keep: bool,

    /// Number of simultaneous downloads
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        default_value_t = DEFAULT_DOWNLOAD_WORKERS,
        help = "Number of simultaneous downloads"
    )]
    pub workers: usize,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl DownloadArgs {
    /// Validate the download command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.station_id.is_none() && self.station_csv.is_none() {
            return Err(Error::configuration(
                "a station id or a CSV file with station ids should be specified".to_string(),
            ));
        }

        if let Some(station_csv) = &self.station_csv {
            if !station_csv.is_file() {
                return Err(Error::configuration(format!(
                    "station list does not exist: {}",
                    station_csv.display()
                )));
            }
        }

        if self.workers == 0 {
            return Err(Error::configuration(
                "number of workers must be greater than 0".to_string(),
            ));
        }

        let (start, end) = self.date_range()?;
        if start > end {
            return Err(Error::configuration(format!(
                "start date {start} is after end date {end}"
            )));
        }

        Ok(())
    }

    /// Parse the requested date range
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::parse_from_str(&self.startdate, DATE_STAMP_FORMAT)
            .map_err(|e| Error::datetime_parsing(format!("invalid start date '{}'", self.startdate), e))?;
        let end = NaiveDate::parse_from_str(&self.enddate, DATE_STAMP_FORMAT)
            .map_err(|e| Error::datetime_parsing(format!("invalid end date '{}'", self.enddate), e))?;
        Ok((start, end))
    }
}

/// Arguments for the combine command
#[derive(Debug, Clone, Parser)]
pub struct CombineArgs {
    /// Input directory of per-day dumps
    ///
    /// Either one station directory, or a directory containing one
    /// subdirectory per station (the layout the download command creates).
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATH",
        help = "Station directory, or directory of station directories"
    )]
    pub input_dir: PathBuf,

    /// Output directory for the per-station NetCDF files
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = ".",
        help = "Output directory for the per-station NetCDF files"
    )]
    pub output_dir: PathBuf,

    /// Fixed station latitude in decimal degrees
    ///
    /// Written once as a scalar variable, independent of the time dimension.
    #[arg(
        long = "lat",
        value_name = "DEGREES",
        requires = "longitude",
        help = "Fixed station latitude in decimal degrees"
    )]
    pub latitude: Option<f64>,

    /// Fixed station longitude in decimal degrees
    #[arg(
        long = "lon",
        value_name = "DEGREES",
        requires = "latitude",
        help = "Fixed station longitude in decimal degrees"
    )]
    pub longitude: Option<f64>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl CombineArgs {
    /// Validate the combine command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.exists() {
            return Err(Error::configuration(format!(
                "input path does not exist: {}",
                self.input_dir.display()
            )));
        }
        if !self.input_dir.is_dir() {
            return Err(Error::configuration(format!(
                "input path is not a directory: {}",
                self.input_dir.display()
            )));
        }
        Ok(())
    }
}

impl Args {
    /// Verbosity settings of the selected command
    pub fn verbosity(&self) -> (u8, bool) {
        match &self.command {
            Some(Commands::Download(args)) => (args.verbose, args.quiet),
            Some(Commands::Combine(args)) => (args.verbose, args.quiet),
            None => (0, false),
        }
    }

    /// Tracing level derived from -v/-q flags
    pub fn get_log_level(&self) -> &'static str {
        let (verbose, quiet) = self.verbosity();
        if quiet {
            return "error";
        }
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Whether progress bars should be shown
    pub fn show_progress(&self) -> bool {
        let (_, quiet) = self.verbosity();
        !quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_args(startdate: &str, enddate: &str) -> DownloadArgs {
        DownloadArgs {
            station_id: Some("IUTRECHT23".to_string()),
            station_csv: None,
            startdate: startdate.to_string(),
            enddate: enddate.to_string(),
            output_dir: PathBuf::from("."),
            keep: false,
            workers: DEFAULT_DOWNLOAD_WORKERS,
            verbose: 0,
            quiet: false,
        }
    }

    #[test]
    fn download_requires_a_station_source() {
        let mut args = download_args("20140101", "20140102");
        args.station_id = None;
        assert!(args.validate().is_err());
    }

    #[test]
    fn download_rejects_malformed_dates() {
        let args = download_args("2014-01-01", "20140102");
        assert!(matches!(
            args.date_range(),
            Err(Error::DateTimeParsing { .. })
        ));
    }

    #[test]
    fn download_rejects_inverted_ranges() {
        let args = download_args("20140103", "20140101");
        assert!(args.validate().is_err());
    }

    #[test]
    fn download_accepts_a_valid_range() {
        let args = download_args("20140101", "20140131");
        assert!(args.validate().is_ok());
        let (start, end) = args.date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2014, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2014, 1, 31).unwrap());
    }
}
