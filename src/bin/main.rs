//! influx-census binary.
//!
//! Writes the census seed records to InfluxDB, then reads the last hour of
//! the census measurement back over Flight SQL and prints each batch as JSON.

use clap::Parser;
use influx_census::{cli::handle_census, config::Args, Settings};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .init();

    info!("influx-census starting up");

    let result = match Settings::load(&args) {
        Ok(settings) => {
            debug!(settings = ?settings, "Loaded configuration");
            handle_census(&settings).await
        }
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
