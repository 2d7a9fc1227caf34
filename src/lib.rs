//! Wunderground Processor Library
//!
//! A Rust library for harvesting Weather Underground personal-weather-station
//! history and consolidating the per-day text dumps into one NetCDF dataset
//! per station.
//!
//! This library provides tools for:
//! - Downloading daily station dumps with a bounded worker pool and
//!   skip-on-rerun caching
//! - Discovering the authoritative field set across heterogeneous daily files
//! - Merging daily rows into length-aligned, column-oriented storage
//! - Enforcing chronological order with a stable sort permutation
//! - Normalizing units per physical quantity and writing self-describing
//!   NetCDF output with per-variable metadata

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod downloader;
        pub mod ingestion;
        pub mod netcdf_writer;
        pub mod schema_discovery;
        pub mod station_combiner;
    }
    pub mod adapters {
        pub mod filesystem;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{CellValue, StationDataset};
pub use config::{CombineConfig, DownloadConfig};

/// Result type alias for the Wunderground processor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Wunderground processing operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// No per-day files found for a station
    #[error("no daily input files found in '{directory}'")]
    NoInputFiles { directory: String },

    /// Date/time parsing error
    #[error("date/time parsing error: {message}")]
    DateTimeParsing {
        message: String,
        #[source]
        source: chrono::ParseError,
    },

    /// NetCDF serialization error
    #[error("NetCDF writing error for '{file}': {message}")]
    NetcdfWriting {
        file: String,
        message: String,
        #[source]
        source: Option<netcdf::Error>,
    },

    /// Download error
    #[error("download error: {message}")]
    Download {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Processing interrupted
    #[error("processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a no-input-files error for a station directory
    pub fn no_input_files(directory: impl Into<String>) -> Self {
        Self::NoInputFiles {
            directory: directory.into(),
        }
    }

    /// Create a date/time parsing error
    pub fn datetime_parsing(message: impl Into<String>, source: chrono::ParseError) -> Self {
        Self::DateTimeParsing {
            message: message.into(),
            source,
        }
    }

    /// Create a NetCDF writing error
    pub fn netcdf_writing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<netcdf::Error>,
    ) -> Self {
        Self::NetcdfWriting {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a download error
    pub fn download(message: impl Into<String>, source: Option<reqwest::Error>) -> Self {
        Self::Download {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(error: chrono::ParseError) -> Self {
        Self::DateTimeParsing {
            message: "date/time parsing failed".to_string(),
            source: error,
        }
    }
}

impl From<netcdf::Error> for Error {
    fn from(error: netcdf::Error) -> Self {
        Self::NetcdfWriting {
            file: "unknown".to_string(),
            message: "NetCDF operation failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Download {
            message: "HTTP request failed".to_string(),
            source: Some(error),
        }
    }
}
