use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;
use wunderground_processor::cli::{args::Args, commands};

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    // Create async runtime and run the main command logic with signal handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        // Set up graceful shutdown handling
        let shutdown_signal = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");

            // Cancel all operations when Ctrl+C is received
            cancellation_token.cancel();
        };

        // Run the main command with cancellation support
        tokio::select! {
            result = commands::run(args, cancellation_token.clone()) => {
                result
            }
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                Err(wunderground_processor::Error::processing_interrupted(
                    "Processing interrupted by user".to_string()
                ))
            }
        }
    });

    match result {
        Ok(()) => {
            // Success - the summary has already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            // Error occurred - print to stderr and exit with error code
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Wunderground Processor - Weather Underground History Harvester");
    println!("==============================================================");
    println!();
    println!("Download historical observations of Weather Underground personal weather");
    println!("stations and combine them into per-station NetCDF datasets.");
    println!();
    println!("USAGE:");
    println!("    wunderground-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    download    Download per-day station dumps from the Wunderground portal");
    println!("    combine     Combine a station's per-day dumps into one NetCDF dataset");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Download one station for 2014, keeping files from earlier runs:");
    println!("    wunderground-processor download -s IUTRECHT23 -b 20140101 -e 20141231 \\");
    println!("                                    -o ./dumps --keep");
    println!();
    println!("    # Combine every downloaded station into NetCDF datasets:");
    println!("    wunderground-processor combine -i ./dumps -o ./datasets");
    println!();
    println!("    # Combine a single station with a fixed position:");
    println!("    wunderground-processor combine -i ./dumps/IUTRECHT23 -o ./datasets \\");
    println!("                                   --lat 52.09 --lon 5.11");
    println!();
    println!("For detailed help on any command, use:");
    println!("    wunderground-processor <COMMAND> --help");
}
