//! Application Startup
//!
//! Binary entry point logic: parse arguments, bring up logging, then run
//! the command file against a fresh application.

use std::io::IsTerminal;

use clap::Parser;
use log::{debug, error, info};

use crate::app::application::Application;
use crate::app::cli::Args;
use crate::app::commands;
use crate::app::error::AppResult;
use crate::core::logging::init_logging;
use crate::core::version;

/// Initialize application startup
pub fn startup() {
    let args = Args::parse();

    let use_color = (args.color || std::io::stdout().is_terminal()) && !args.no_color;
    let log_file = args
        .log_file
        .as_ref()
        .map(|path| path.to_string_lossy().to_string());
    if let Err(err) = init_logging(
        args.log_level.as_deref(),
        args.log_format.as_deref(),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("Could not initialise logging: {}", err);
        std::process::exit(2);
    }

    info!("daqflow {}", version::long_version());

    if let Err(err) = run(&args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> AppResult<()> {
    let commands = commands::read_commands(&args.commands)?;
    info!(
        "Read {} command(s) from '{}'",
        commands.len(),
        args.commands.display()
    );

    let app = Application::new();
    app.run_commands(&commands)?;

    for snapshot in app.queue_snapshots() {
        debug!(
            "Queue '{}': {}/{} occupied at shutdown",
            snapshot.name, snapshot.occupancy, snapshot.capacity
        );
    }
    info!("Command sequence complete in state '{}'", app.state()?);
    Ok(())
}
