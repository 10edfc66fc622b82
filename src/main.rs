use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use feedwatch::cli::Cli;
use feedwatch::{Application, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    if let Err(e) = feedwatch::logging::init(&config.logging) {
        eprintln!("Failed to open log file: {e}");
        // Fall back to console-only logging
        feedwatch::logging::init_console_only(&config.logging.level);
    }

    info!("feedwatch {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Checking {} watch list(s) every {} minute(s)",
        config.watch.files.len(),
        config.watch.interval_minutes
    );

    let app = match Application::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Startup failed: {e}");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match app.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Startup failed: {e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
