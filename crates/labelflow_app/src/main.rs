mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;
use flow_logging::{flow_error, flow_info, LogDestination};
use log::LevelFilter;

use cli::{Cli, Command};
use platform::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match AppConfig::resolve(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("labelflow: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let destination = LogDestination::parse(&config.log).unwrap_or_else(|| {
        eprintln!("labelflow: unknown log destination '{}', using file", config.log);
        LogDestination::File
    });
    flow_logging::initialize(destination, LevelFilter::Info, &config.log_file);
    flow_info!("Starting labelflow against {}", config.base_url);

    let result = match &cli.command {
        None => platform::run_interactive(&config),
        Some(Command::Run { file, prompt }) => platform::run_once(&config, file, prompt)
            .map(|saved| println!("Saved {}", saved.display())),
        Some(Command::Theme) => platform::toggle_theme(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            flow_error!("labelflow failed: {:#}", err);
            eprintln!("labelflow: {err:#}");
            ExitCode::FAILURE
        }
    }
}
