//! Resin release tool - Entry Point
//!
//! Pins release groups, or the whole fleet, of a balena application to a
//! release commit.

use clap::Parser;
use tracing::error;

use releaser::app::options::ReleaserOptions;
use releaser::app::run::run;
use releaser::cli::Cli;
use releaser::logs::init_logging;
use releaser::storage::settings::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Retrieve the settings file, if any
    let settings = match &cli.settings {
        Some(path) => match Settings::load(path).await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file: {e}");
                std::process::exit(e.exit_code());
            }
        },
        None => Settings::default(),
    };

    let options = ReleaserOptions::resolve(&cli, &settings);

    // Initialize logging
    if let Err(e) = init_logging(&options.logs) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = run(options, cli.command).await {
        error!("{e}");
        std::process::exit(e.exit_code());
    }
}
