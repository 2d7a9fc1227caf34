//! Bounded-concurrency downloader for per-day station dumps
//!
//! Fetches one day's history per task from the Wunderground portal and
//! writes it as `<stationid>_<YYYYMMDD>.txt`. Re-runs are idempotent: with
//! keep semantics an existing non-empty file is skipped and a zero-byte file
//! counts as absent. The shared progress counter is the only
//! concurrently-mutated state.

use chrono::{Datelike, Days, NaiveDate};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DownloadConfig;
use crate::constants::{DATE_STAMP_FORMAT, DOWNLOAD_TIMEOUT_SECS, STATION_ID_COLUMN};
use crate::{Error, Result};

/// Counters for one station's download run
#[derive(Debug, Clone, Default)]
pub struct DownloadStats {
    /// Days in the requested range
    pub days_total: usize,
    /// Files freshly fetched
    pub downloaded: usize,
    /// Existing non-empty files kept untouched
    pub kept: usize,
    /// Days whose fetch failed; a re-run retries exactly these
    pub failed: usize,
}

impl DownloadStats {
    /// Merge the counters of another run into this one
    pub fn merge(&mut self, other: &DownloadStats) {
        self.days_total += other.days_total;
        self.downloaded += other.downloaded;
        self.kept += other.kept;
        self.failed += other.failed;
    }
}

enum DayResult {
    Downloaded,
    Kept,
    Failed,
    Cancelled,
}

/// Downloader with a bounded worker pool
pub struct Downloader {
    config: DownloadConfig,
    client: reqwest::Client,
}

impl Downloader {
    /// Create a downloader from a validated configuration
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::download("failed to build HTTP client", Some(e)))?;
        Ok(Self { config, client })
    }

    /// Every day of the inclusive range
    pub fn day_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;
        while current <= end {
            days.push(current);
            match current.checked_add_days(Days::new(1)) {
                Some(next) => current = next,
                None => break,
            }
        }
        days
    }

    /// Daily-history URL for one station and day
    pub fn daily_url(&self, station_id: &str, day: NaiveDate) -> String {
        format!(
            "{}?ID={}&day={}&year={}&month={}&format=1",
            self.config.base_url,
            station_id,
            day.day(),
            day.year(),
            day.month()
        )
    }

    /// Target file for one station and day
    pub fn daily_file(station_dir: &Path, station_id: &str, day: NaiveDate) -> PathBuf {
        station_dir.join(format!(
            "{}_{}.txt",
            station_id,
            day.format(DATE_STAMP_FORMAT)
        ))
    }

    /// Download the full date range for one station.
    ///
    /// Tasks run through a bounded pool of `workers`; cancellation stops
    /// scheduling new days while in-flight fetches finish.
    pub async fn download_station(
        &self,
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
        show_progress: bool,
    ) -> Result<DownloadStats> {
        let station_dir = self.config.output_dir.join(station_id);
        tokio::fs::create_dir_all(&station_dir).await.map_err(|e| {
            Error::io(
                format!("failed to create station directory {}", station_dir.display()),
                e,
            )
        })?;

        let days = Self::day_range(start, end);
        info!(
            "Download data for station {}: {} days into {}",
            station_id,
            days.len(),
            station_dir.display()
        );

        let completed = Arc::new(AtomicUsize::new(0));
        let progress = if show_progress {
            let bar = ProgressBar::new(days.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap()
                    .progress_chars("#>-"),
            );
            bar.set_message(format!("Downloading {station_id}"));
            bar
        } else {
            ProgressBar::hidden()
        };

        let results: Vec<DayResult> = stream::iter(days.iter().copied().map(|day| {
            let completed = Arc::clone(&completed);
            let progress = progress.clone();
            let station_dir = station_dir.clone();
            async move {
                if cancel.is_cancelled() {
                    return DayResult::Cancelled;
                }
                let result = match self.fetch_day(&station_dir, station_id, day).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("Download failed for {} on {}: {}", station_id, day, e);
                        DayResult::Failed
                    }
                };
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                progress.set_position(done as u64);
                result
            }
        }))
        .buffer_unordered(self.config.workers)
        .collect()
        .await;

        progress.finish_with_message(format!("Downloaded {station_id}"));

        let mut stats = DownloadStats {
            days_total: days.len(),
            ..DownloadStats::default()
        };
        let mut cancelled = false;
        for result in results {
            match result {
                DayResult::Downloaded => stats.downloaded += 1,
                DayResult::Kept => stats.kept += 1,
                DayResult::Failed => stats.failed += 1,
                DayResult::Cancelled => cancelled = true,
            }
        }
        if cancelled {
            return Err(Error::processing_interrupted(format!(
                "download of {station_id} cancelled"
            )));
        }

        info!(
            "Download data for station {} [completed]: {} fetched, {} kept, {} failed",
            station_id, stats.downloaded, stats.kept, stats.failed
        );
        Ok(stats)
    }

    /// Fetch one day, honouring keep semantics
    async fn fetch_day(
        &self,
        station_dir: &Path,
        station_id: &str,
        day: NaiveDate,
    ) -> Result<DayResult> {
        let target = Self::daily_file(station_dir, station_id, day);

        match tokio::fs::metadata(&target).await {
            Ok(metadata) if self.config.keep_existing && metadata.len() > 0 => {
                debug!("Keeping existing {}", target.display());
                return Ok(DayResult::Kept);
            }
            Ok(_) => {
                // Zero-byte files count as absent; stale files are refetched
                tokio::fs::remove_file(&target).await.map_err(|e| {
                    Error::io(format!("failed to remove stale {}", target.display()), e)
                })?;
            }
            Err(_) => {}
        }

        let url = self.daily_url(station_id, day);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::download(format!("request failed: {url}"), Some(e)))?
            .error_for_status()
            .map_err(|e| Error::download(format!("server rejected: {url}"), Some(e)))?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::download(format!("failed to read body of {url}"), Some(e)))?;

        tokio::fs::write(&target, normalize_body(&body))
            .await
            .map_err(|e| Error::io(format!("failed to write {}", target.display()), e))?;

        Ok(DayResult::Downloaded)
    }
}

/// Minimal normalization of a portal response body
fn normalize_body(body: &str) -> String {
    body.replace("\r\n", "\n").replace("&nbsp;", " ")
}

/// Station identifiers from a station-list CSV file
pub fn station_ids_from_csv(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| {
            Error::csv_parsing(
                path.display().to_string(),
                "failed to open station list",
                Some(e),
            )
        })?;

    let headers = reader
        .headers()
        .map_err(|e| {
            Error::csv_parsing(
                path.display().to_string(),
                "failed to read station list header",
                Some(e),
            )
        })?
        .clone();
    let Some(id_index) = headers.iter().position(|name| name == STATION_ID_COLUMN) else {
        return Err(Error::configuration(format!(
            "station list {} has no '{}' column",
            path.display(),
            STATION_ID_COLUMN
        )));
    };

    let mut station_ids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            Error::csv_parsing(
                path.display().to_string(),
                "failed to read station list row",
                Some(e),
            )
        })?;
        if let Some(id) = record.get(id_index) {
            if !id.is_empty() {
                station_ids.push(id.to_string());
            }
        }
    }
    Ok(station_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_range_is_inclusive() {
        let days = Downloader::day_range(day(2014, 2, 27), day(2014, 3, 2));
        assert_eq!(
            days,
            vec![
                day(2014, 2, 27),
                day(2014, 2, 28),
                day(2014, 3, 1),
                day(2014, 3, 2)
            ]
        );
        assert_eq!(Downloader::day_range(day(2014, 1, 1), day(2014, 1, 1)).len(), 1);
        assert!(Downloader::day_range(day(2014, 1, 2), day(2014, 1, 1)).is_empty());
    }

    #[test]
    fn daily_url_carries_station_and_date_query() {
        let downloader = Downloader::new(DownloadConfig::default()).unwrap();
        let url = downloader.daily_url("IUTRECHT23", day(2014, 7, 1));
        assert!(url.starts_with("http://www.wunderground.com/weatherstation/WXDailyHistory.asp?"));
        assert!(url.contains("ID=IUTRECHT23"));
        assert!(url.contains("day=1"));
        assert!(url.contains("year=2014"));
        assert!(url.contains("month=7"));
        assert!(url.ends_with("format=1"));
    }

    #[test]
    fn daily_file_follows_the_naming_convention() {
        let path = Downloader::daily_file(Path::new("/data/IUTRECHT23"), "IUTRECHT23", day(2014, 7, 1));
        assert_eq!(
            path,
            Path::new("/data/IUTRECHT23/IUTRECHT23_20140701.txt")
        );
    }

    #[test]
    fn body_normalization_keeps_marker_lines() {
        let raw = "Time,TemperatureC,DateUTC<br>\r\n2014-07-01&nbsp;00:05:00,18.3,2014-06-30 22:05:00\r\n<br>\r\n";
        let cleaned = normalize_body(raw);
        assert_eq!(
            cleaned,
            "Time,TemperatureC,DateUTC<br>\n2014-07-01 00:05:00,18.3,2014-06-30 22:05:00\n<br>\n"
        );
    }

    #[test]
    fn station_ids_come_from_the_station_id_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stations.csv");
        fs::write(
            &path,
            "Station ID,Label\nIUTRECHT23,Utrecht\nIHARV2,Harderwijk\n,empty\n",
        )
        .unwrap();
        let ids = station_ids_from_csv(&path).unwrap();
        assert_eq!(ids, vec!["IUTRECHT23", "IHARV2"]);
    }

    #[test]
    fn station_list_without_id_column_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stations.csv");
        fs::write(&path, "Name\nUtrecht\n").unwrap();
        assert!(matches!(
            station_ids_from_csv(&path),
            Err(Error::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn keep_semantics_skip_non_empty_and_refetch_zero_byte() {
        // Exercises only the local decision branch; the refetch path fails at
        // the network layer and surfaces as an error we do not assert on.
        let dir = tempdir().unwrap();
        let config = DownloadConfig::default()
            .with_output_dir(dir.path())
            .with_keep_existing(true)
            .with_base_url("http://127.0.0.1:9/unreachable");
        let downloader = Downloader::new(config).unwrap();
        let station_dir = dir.path().join("ITEST1");
        fs::create_dir_all(&station_dir).unwrap();

        let kept_day = day(2014, 7, 1);
        let target = Downloader::daily_file(&station_dir, "ITEST1", kept_day);
        fs::write(&target, "Time,DateUTC\n").unwrap();

        let result = downloader
            .fetch_day(&station_dir, "ITEST1", kept_day)
            .await
            .unwrap();
        assert!(matches!(result, DayResult::Kept));

        let empty_day = day(2014, 7, 2);
        let empty_target = Downloader::daily_file(&station_dir, "ITEST1", empty_day);
        fs::write(&empty_target, "").unwrap();

        let result = downloader.fetch_day(&station_dir, "ITEST1", empty_day).await;
        // The zero-byte file was removed before the (failing) fetch
        assert!(result.is_err());
        assert!(!empty_target.exists());
    }
}
