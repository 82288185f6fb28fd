use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::pipeline::load_ledger;
use crate::reports::generate_all;
use crate::settings::load_settings;
use crate::sink::FileSink;

pub fn run(settings_path: &Path, output: &Path) -> Result<()> {
    let settings = load_settings(settings_path)?;
    // Every source must load before anything is written.
    let ledger = load_ledger(&settings)?;

    let mut sink = FileSink::new(output)?;
    let summary = generate_all(&ledger, &mut sink)?;

    println!(
        "{} transactions from {} sources, {} expenses",
        summary.transactions,
        settings.sources.len(),
        summary.expenses
    );
    println!("{} reports written to {}", summary.reports, sink.root().display());
    if summary.uncategorized > 0 {
        println!(
            "{}",
            format!(
                "{} distinct uncategorized texts, see {}",
                summary.uncategorized,
                crate::reports::UNCATEGORIZED_LIST
            )
            .yellow()
        );
    }
    Ok(())
}
