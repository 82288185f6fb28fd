use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::aggregate::{aggregate_report, AggOp, AggregationMapping};
use crate::error::Result;
use crate::fmt::amount;
use crate::pipeline::load_ledger;
use crate::settings::load_settings;
use crate::table::transactions_table;

pub fn run(settings_path: &Path, by: &str) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let ledger = load_ledger(&settings)?;
    let data = transactions_table(&ledger);

    let mapping = AggregationMapping::new().with("Amount", AggOp::Sum);
    let report = aggregate_report(&data, by, &mapping)?;
    if report.all.is_empty() {
        println!("No transactions.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![by, "Amount"]);
    let mut total = 0.0;
    for (label, value) in report.chart_series() {
        total += value;
        let shown = if value < 0.0 {
            amount(value).red()
        } else {
            amount(value).green()
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(shown).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(amount(total).bold()).set_alignment(CellAlignment::Right),
    ]);

    println!("Transactions by {by}\n{table}");
    Ok(())
}
