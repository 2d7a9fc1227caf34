//! Configuration management and validation.
//!
//! Provides configuration structures for the combine pipeline and the
//! daily-dump downloader, with defaults matching the Wunderground portal
//! conventions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{DAILY_HISTORY_URL, DEFAULT_DOWNLOAD_WORKERS};
use crate::{Error, Result};

/// Configuration for combining one or more station directories into
/// per-station NetCDF datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineConfig {
    /// Input directory: either one station directory of per-day dumps, or a
    /// directory containing one subdirectory per station
    pub input_dir: PathBuf,

    /// Output directory for the per-station NetCDF files
    pub output_dir: PathBuf,

    /// Fixed station latitude in decimal degrees, written as a scalar
    pub latitude: Option<f64>,

    /// Fixed station longitude in decimal degrees, written as a scalar
    pub longitude: Option<f64>,
}

impl CombineConfig {
    /// Create a combine configuration without a fixed position
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            latitude: None,
            longitude: None,
        }
    }

    /// Attach a fixed geographic position to the station
    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Fixed position, if both coordinates were supplied
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Validate paths and coordinate ranges
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.is_dir() {
            return Err(Error::configuration(format!(
                "input directory does not exist: {}",
                self.input_dir.display()
            )));
        }

        match (self.latitude, self.longitude) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::configuration(
                    "latitude and longitude must be provided as a pair".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(Error::configuration(format!(
                    "invalid latitude {lat}: must be between -90 and 90 degrees"
                )));
            }
        }

        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(Error::configuration(format!(
                    "invalid longitude {lon}: must be between -180 and 180 degrees"
                )));
            }
        }

        Ok(())
    }
}

/// Configuration for the daily-dump downloader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output directory; one subdirectory per station is created below it
    pub output_dir: PathBuf,

    /// Width of the bounded worker pool
    pub workers: usize,

    /// Keep existing non-empty daily files instead of re-downloading them;
    /// zero-byte files always count as absent
    pub keep_existing: bool,

    /// Base URL of the daily-history endpoint
    pub base_url: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            workers: DEFAULT_DOWNLOAD_WORKERS,
            keep_existing: false,
            base_url: DAILY_HISTORY_URL.to_string(),
        }
    }
}

impl DownloadConfig {
    /// Set the output directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Set the worker pool width
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Keep existing non-empty daily files on re-runs
    pub fn with_keep_existing(mut self, keep_existing: bool) -> Self {
        self.keep_existing = keep_existing;
        self
    }

    /// Override the daily-history endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Validate pool width and endpoint
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.base_url.is_empty() {
            return Err(Error::configuration("base URL must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_config_rejects_half_position() {
        let mut config = CombineConfig::new(".", "out");
        config.latitude = Some(52.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn combine_config_rejects_out_of_range_coordinates() {
        let config = CombineConfig::new(".", "out").with_position(95.0, 5.0);
        assert!(config.validate().is_err());
        let config = CombineConfig::new(".", "out").with_position(52.0, 200.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn combine_config_accepts_valid_position() {
        let config = CombineConfig::new(".", "out").with_position(52.1, 5.2);
        assert!(config.validate().is_ok());
        assert_eq!(config.position(), Some((52.1, 5.2)));
    }

    #[test]
    fn download_config_defaults() {
        let config = DownloadConfig::default();
        assert_eq!(config.workers, DEFAULT_DOWNLOAD_WORKERS);
        assert!(!config.keep_existing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn download_config_rejects_zero_workers() {
        let config = DownloadConfig::default().with_workers(0);
        assert!(config.validate().is_err());
    }
}
