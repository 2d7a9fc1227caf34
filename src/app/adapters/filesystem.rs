//! Filesystem layout conventions for station data
//!
//! One directory per station; per-day dumps named
//! `<stationid>_<YYYYMMDD>.txt` so lexicographic filename order is also
//! chronological order; one `<stationid>.nc` output per station.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

use crate::constants::{DAILY_FILE_PATTERN, NETCDF_EXTENSION};
use crate::{Error, Result};

fn daily_file_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(DAILY_FILE_PATTERN).expect("daily file pattern is valid"))
}

/// Whether a path follows the per-day dump naming convention
pub fn is_daily_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| daily_file_regex().is_match(name))
}

/// All daily files of one station directory, sorted by filename.
///
/// The explicit sort keeps later pipeline steps independent of accidental
/// OS directory ordering.
pub fn daily_files(station_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(station_dir).map_err(|e| {
        Error::io(
            format!("failed to read directory {}", station_dir.display()),
            e,
        )
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_daily_file(path))
        .collect();
    files.sort();
    Ok(files)
}

/// Station identifier derived from the input directory name
pub fn station_id(station_dir: &Path) -> String {
    station_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| station_dir.display().to_string())
}

/// Output container path for one station
pub fn output_path(output_dir: &Path, station_id: &str) -> PathBuf {
    output_dir.join(format!("{station_id}.{NETCDF_EXTENSION}"))
}

/// Skip rule: an existing non-empty output counts as already done
pub fn is_complete(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|metadata| metadata.len() > 0)
        .unwrap_or(false)
}

/// Station directories below an input root.
///
/// A root that holds daily files directly is a single station; otherwise
/// every immediate subdirectory is one station, sorted by name.
pub fn station_dirs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(Error::io(
            format!("input directory does not exist: {}", input_dir.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
        ));
    }

    if !daily_files(input_dir)?.is_empty() {
        return Ok(vec![input_dir.to_path_buf()]);
    }

    let mut dirs: Vec<PathBuf> = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();
    dirs.sort();

    if dirs.is_empty() {
        return Err(Error::no_input_files(input_dir.display().to_string()));
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn daily_file_convention_is_enforced() {
        assert!(is_daily_file(Path::new("IUTRECHT23_20140701.txt")));
        assert!(is_daily_file(Path::new("/data/IHARV2/IHARV2_20101231.txt")));
        assert!(!is_daily_file(Path::new("IUTRECHT23_2014071.txt")));
        assert!(!is_daily_file(Path::new("IUTRECHT23_20140701.csv")));
        assert!(!is_daily_file(Path::new("notes.txt")));
    }

    #[test]
    fn daily_files_are_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ITEST1_20140102.txt"), "Time,DateUTC\n").unwrap();
        fs::write(dir.path().join("ITEST1_20140101.txt"), "Time,DateUTC\n").unwrap();
        fs::write(dir.path().join("README.txt"), "not a daily file\n").unwrap();

        let files = daily_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ITEST1_20140101.txt", "ITEST1_20140102.txt"]);
    }

    #[test]
    fn station_id_is_the_directory_basename() {
        assert_eq!(station_id(Path::new("/data/IUTRECHT23")), "IUTRECHT23");
    }

    #[test]
    fn completeness_requires_non_zero_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ITEST1.nc");
        assert!(!is_complete(&path));
        fs::write(&path, b"").unwrap();
        assert!(!is_complete(&path));
        fs::write(&path, b"x").unwrap();
        assert!(is_complete(&path));
    }

    #[test]
    fn root_with_daily_files_is_a_single_station() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ITEST1_20140101.txt"), "Time,DateUTC\n").unwrap();
        let dirs = station_dirs(dir.path()).unwrap();
        assert_eq!(dirs, vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn root_of_station_directories_lists_children_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("IB")).unwrap();
        fs::create_dir(dir.path().join("IA")).unwrap();
        let dirs = station_dirs(dir.path()).unwrap();
        assert_eq!(
            dirs,
            vec![dir.path().join("IA"), dir.path().join("IB")]
        );
    }

    #[test]
    fn empty_root_is_a_no_input_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            station_dirs(dir.path()),
            Err(Error::NoInputFiles { .. })
        ));
    }
}
