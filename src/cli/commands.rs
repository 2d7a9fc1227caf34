//! Command implementations for the Wunderground processor CLI
//!
//! This module contains the command execution logic, logging setup, and
//! summary reporting for the CLI interface.

use colored::Colorize;
use indicatif::HumanDuration;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::app::services::downloader::{self, DownloadStats, Downloader};
use crate::app::services::station_combiner::{BatchStats, StationCombiner};
use crate::cli::args::{Args, CombineArgs, Commands, DownloadArgs};
use crate::config::{CombineConfig, DownloadConfig};
use crate::{Error, Result};

/// Main command runner for the Wunderground processor
///
/// Sets up logging, dispatches the selected subcommand, and prints the
/// summary report.
pub async fn run(args: Args, cancel: CancellationToken) -> Result<()> {
    setup_logging(&args)?;

    info!("Starting Wunderground processor");
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Some(Commands::Download(download_args)) => {
            run_download(download_args.clone(), args.show_progress(), cancel).await
        }
        Some(Commands::Combine(combine_args)) => {
            run_combine(combine_args.clone(), args.show_progress())
        }
        None => Ok(()),
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wunderground_processor={log_level}")));

    let (_, quiet) = args.verbosity();
    if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Execute the download command
async fn run_download(
    args: DownloadArgs,
    show_progress: bool,
    cancel: CancellationToken,
) -> Result<()> {
    args.validate()?;
    let (start, end) = args.date_range()?;

    let station_ids = if let Some(station_id) = &args.station_id {
        vec![station_id.clone()]
    } else if let Some(station_csv) = &args.station_csv {
        downloader::station_ids_from_csv(station_csv)?
    } else {
        Vec::new()
    };
    if station_ids.is_empty() {
        return Err(Error::configuration(
            "no stations to download".to_string(),
        ));
    }

    let config = DownloadConfig::default()
        .with_output_dir(&args.output_dir)
        .with_workers(args.workers)
        .with_keep_existing(args.keep);
    config.validate()?;
    let downloader = Downloader::new(config)?;

    let run_start = Instant::now();
    let mut totals = DownloadStats::default();
    let mut failed_stations = 0usize;

    for station_id in &station_ids {
        if cancel.is_cancelled() {
            return Err(Error::processing_interrupted(
                "download cancelled".to_string(),
            ));
        }
        match downloader
            .download_station(station_id, start, end, &cancel, show_progress)
            .await
        {
            Ok(stats) => totals.merge(&stats),
            Err(e @ Error::ProcessingInterrupted { .. }) => return Err(e),
            Err(e) => {
                error!("Download failed for station {}: {}", station_id, e);
                failed_stations += 1;
            }
        }
    }

    println!();
    println!("{}", "Download summary".bold());
    println!("  stations:   {}", station_ids.len());
    println!(
        "  days:       {} total, {} fetched, {} kept, {} failed",
        totals.days_total,
        totals.downloaded.to_string().green(),
        totals.kept,
        format_count(totals.failed)
    );
    if failed_stations > 0 {
        println!("  {} station(s) failed entirely", failed_stations.to_string().red());
    }
    println!("  finished in {}", HumanDuration(run_start.elapsed()));

    Ok(())
}

/// Execute the combine command
fn run_combine(args: CombineArgs, show_progress: bool) -> Result<()> {
    args.validate()?;

    let mut config = CombineConfig::new(&args.input_dir, &args.output_dir);
    if let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) {
        config = config.with_position(latitude, longitude);
    }
    config.validate()?;

    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        Error::io(
            format!(
                "failed to create output directory {}",
                config.output_dir.display()
            ),
            e,
        )
    })?;

    let combiner = StationCombiner::new(config);
    let run_start = Instant::now();
    let stats = combiner.combine_all(show_progress)?;

    print_combine_summary(&stats, run_start);
    Ok(())
}

fn print_combine_summary(stats: &BatchStats, run_start: Instant) {
    println!();
    println!("{}", "Combine summary".bold());
    println!("  stations:   {}", stats.stations);
    println!(
        "  {} written, {} already up to date, {} without data, {} failed",
        stats.written.to_string().green(),
        stats.up_to_date,
        stats.nothing_to_write,
        format_count(stats.failed)
    );
    println!("  finished in {}", HumanDuration(run_start.elapsed()));
}

fn format_count(count: usize) -> String {
    if count > 0 {
        count.to_string().red().to_string()
    } else {
        count.to_string()
    }
}
