mod aggregate;
mod calendar;
mod categorizer;
mod cleaner;
mod cli;
mod error;
mod fmt;
mod importer;
mod models;
mod pipeline;
mod reports;
mod settings;
mod sink;
mod table;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { settings, output } => cli::run::run(&settings, &output),
        Commands::Summary { settings, by } => cli::summary::run(&settings, &by),
        Commands::Classify { text, settings } => cli::classify::run(&text, &settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
