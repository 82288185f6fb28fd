pub mod classify;
pub mod run;
pub mod summary;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::DEFAULT_SETTINGS_FILE;

#[derive(Parser)]
#[command(
    name = "spendlens",
    about = "Categorize bank statements and build spending reports."
)]
pub struct Cli {
    /// Log pipeline details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load every source, categorize, and write all reports.
    Run {
        /// Settings file with sources, source types and categorizations
        #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
        settings: PathBuf,
        /// Directory that receives reports and exports
        #[arg(long, default_value = "output")]
        output: PathBuf,
    },
    /// Print totals of all transactions grouped by one dimension.
    Summary {
        #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
        settings: PathBuf,
        /// Grouping column, e.g. Category, Month, Year, Weekday
        #[arg(long, default_value = "Category")]
        by: String,
    },
    /// Show how a statement memo is cleaned and categorized.
    Classify {
        /// Memo text as it appears on the statement
        text: String,
        #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
        settings: PathBuf,
    },
}
