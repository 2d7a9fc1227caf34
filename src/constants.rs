//! Application constants for the Wunderground processor
//!
//! This module contains the field markers, format strings, and default
//! values used throughout the Wunderground processor application.

use chrono::NaiveDateTime;

// =============================================================================
// Daily File Format
// =============================================================================

/// Local-time field present in every daily dump; carries the corrupt-line
/// marker on non-data lines
pub const LOCAL_TIME_FIELD: &str = "Time";

/// Substring identifying the UTC timestamp field in a daily file header
/// (the portal emits it as `DateUTC` or `DateUTC<br>`)
pub const UTC_FIELD_MARKER: &str = "DateUTC";

/// Literal time-field value marking a non-data line in a daily dump
pub const CORRUPT_LINE_MARKER: &str = "<br>";

/// Strict timestamp pattern for the UTC time field
pub const UTC_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date stamp embedded in daily file names (`<stationid>_<YYYYMMDD>.txt`)
pub const DATE_STAMP_FORMAT: &str = "%Y%m%d";

/// Daily file naming convention; lexicographic order of matching names is
/// also chronological order
pub const DAILY_FILE_PATTERN: &str = r"^[A-Za-z0-9]+_\d{8}\.txt$";

// =============================================================================
// NetCDF Output
// =============================================================================

/// Extension of the per-station output container
pub const NETCDF_EXTENSION: &str = "nc";

/// Units of the time axis
pub const TIME_UNITS: &str = "minutes since 2010-01-01 00:00:00";

/// Calendar of the time axis
pub const TIME_CALENDAR: &str = "gregorian";

/// Fill value for missing numeric samples, distinct from any real measurement
pub const FILL_VALUE: f64 = -999.0;

/// Deflate level applied to compressed output variables
pub const DEFLATE_LEVEL: i32 = 4;

/// Reference instant of the time axis
pub fn time_epoch() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2010, 1, 1)
        .expect("epoch date is valid")
        .and_hms_opt(0, 0, 0)
        .expect("epoch time is valid")
}

// =============================================================================
// Download Defaults
// =============================================================================

/// Daily-history endpoint of the Wunderground portal
pub const DAILY_HISTORY_URL: &str =
    "http://www.wunderground.com/weatherstation/WXDailyHistory.asp";

/// Number of simultaneous per-day downloads
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 8;

/// HTTP request timeout in seconds
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Column naming the stations in a station-list CSV file
pub const STATION_ID_COLUMN: &str = "Station ID";
