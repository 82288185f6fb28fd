use tracing::info;

use crate::aggregate::{aggregate_report, AggOp, AggregationMapping, Report};
use crate::error::Result;
use crate::models::{amount_column, Transaction, TxnType, INVESTMENTS, UNCATEGORIZED};
use crate::sink::ReportSink;
use crate::table::{transactions_table, Table, Value};

/// Calendar columns carried through every aggregate as representatives.
pub const FIRST_COLUMNS: &[&str] = &[
    "Year",
    "Quarter",
    "Season",
    "Month",
    "MonthName",
    "Week",
    "WeekNumber",
    "Weekday",
    "IsWeekend",
    "DayOfMonth",
];

/// Report name and grouping column, aggregated from the by-date result.
const DATE_DERIVED_REPORTS: &[(&str, &str)] = &[
    ("b-byWeekday", "Weekday"),
    ("c-byWeek", "Week"),
    ("d-byMonth", "Month"),
    ("e-byMonthName", "MonthName"),
    ("f-byQuarter", "Quarter"),
    ("g-bySeason", "Season"),
    ("h-byYear", "Year"),
];

pub const TRANSACTIONS_EXPORT: &str = "transactions_all.csv";
pub const INCOMES_EXPORT: &str = "incomes/incomes_all.csv";
pub const INVESTMENTS_EXPORT: &str = "investments/investments_all.csv";
pub const UNCATEGORIZED_LIST: &str = "uncategorized.txt";

/// Amount columns to sum: `Amount` plus one per category present in the
/// data and `Uncategorized`, sorted by name.
pub fn amount_columns(table: &Table) -> Vec<String> {
    let mut columns: Vec<String> = table
        .unique("Category")
        .iter()
        .map(|c| amount_column(&c.to_string()))
        .chain([amount_column(UNCATEGORIZED), "Amount".to_string()])
        .filter(|c| table.has_column(c))
        .collect();
    columns.sort();
    columns.dedup();
    columns
}

pub fn report_mapping(table: &Table) -> AggregationMapping {
    let mut mapping = AggregationMapping::new();
    for column in amount_columns(table) {
        mapping = mapping.with(column, AggOp::Sum);
    }
    for column in FIRST_COLUMNS {
        mapping = mapping.with(*column, AggOp::First);
    }
    mapping
}

/// One report per reporting dimension. Calendar dimensions are rolled up
/// from the by-date aggregate; categories need the row-level data.
pub fn generate_reports(
    data: &Table,
    mapping: &AggregationMapping,
    prefix: &str,
    sink: &mut dyn ReportSink,
) -> Result<Vec<(String, Report)>> {
    let mut out = Vec::new();

    let by_date = aggregate_report(data, "Date", mapping)?;
    for (name, dimension) in DATE_DERIVED_REPORTS {
        let report = aggregate_report(&by_date.all, dimension, mapping)?;
        out.push((format!("{prefix}{name}"), report));
    }
    out.insert(0, (format!("{prefix}a-byDate"), by_date));
    out.push((
        format!("{prefix}i-byCategory"),
        aggregate_report(data, "Category", mapping)?,
    ));

    for (title, report) in &out {
        sink.write_report(title, report)?;
    }
    Ok(out)
}

/// Distinct texts of uncategorized transactions in ledger order.
pub fn uncategorized_texts(ledger: &[Transaction]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for txn in ledger.iter().filter(|t| t.category == UNCATEGORIZED) {
        if let Some(text) = &txn.text {
            if !out.contains(text) {
                out.push(text.clone());
            }
        }
    }
    out
}

pub struct RunSummary {
    pub transactions: usize,
    pub expenses: usize,
    pub reports: usize,
    pub uncategorized: usize,
}

/// Produce every report and export for a merged ledger.
pub fn generate_all(ledger: &[Transaction], sink: &mut dyn ReportSink) -> Result<RunSummary> {
    let table = transactions_table(ledger);
    sink.write_table(TRANSACTIONS_EXPORT, &table)?;

    let mapping = report_mapping(&table);
    let mut expenses = table.filter_by("Type", |v| *v == Value::from(TxnType::Expense.as_str()));
    expenses.abs_columns(&mapping.columns_with(AggOp::Sum));

    let mut reports = generate_reports(&expenses, &mapping, "expenses/", sink)?.len();
    for year in expenses.unique("Year") {
        let for_year = expenses.filter_by("Year", |v| *v == year);
        let prefix = format!("expenses/{year}/");
        reports += generate_reports(&for_year, &mapping, &prefix, sink)?.len();
    }

    let incomes = table.filter_by("Type", |v| *v == Value::from(TxnType::Income.as_str()));
    sink.write_table(INCOMES_EXPORT, &incomes)?;
    let investments = table.filter_by("Category", |v| *v == Value::from(INVESTMENTS));
    sink.write_table(INVESTMENTS_EXPORT, &investments)?;

    let uncategorized = uncategorized_texts(ledger);
    sink.write_lines(UNCATEGORIZED_LIST, &uncategorized)?;

    info!(reports, expenses = expenses.len(), "reports generated");
    Ok(RunSummary {
        transactions: ledger.len(),
        expenses: expenses.len(),
        reports,
        uncategorized: uncategorized.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::CategoryRules;
    use crate::models::{SourceSpec, SourceType, StagedRow};
    use crate::pipeline::transform_source;
    use crate::sink::MemorySink;
    use chrono::NaiveDate;

    fn ledger() -> Vec<Transaction> {
        let rules = CategoryRules::new(vec![
            ("Food".to_string(), vec!["ica".to_string(), "coop".to_string()]),
            ("Investments".to_string(), vec!["avanza".to_string()]),
            ("Salary".to_string(), vec!["lön".to_string()]),
        ]);
        let spec = SourceSpec {
            path: "bank.csv".to_string(),
            source_type: "seb".to_string(),
            modifier: 1.0,
            account: "Default".to_string(),
        };
        let rows = [
            ((2023, 12, 30), -100.0, "ICA Nära"),
            ((2023, 12, 30), -20.0, "Pressbyrån"),
            ((2024, 1, 2), -50.0, "Coop"),
            ((2024, 1, 3), -300.0, "Avanza"),
            ((2024, 1, 25), 25000.0, "Lön"),
            ((2024, 2, 10), -80.0, "Pressbyrån"),
        ];
        let staged = rows
            .iter()
            .map(|((y, m, d), amount, text)| StagedRow {
                date: NaiveDate::from_ymd_opt(*y, *m, *d),
                amount: Some(*amount),
                text: Some(text.to_string()),
                account: "Default".to_string(),
                ..Default::default()
            })
            .collect();
        let txns = transform_source(staged, &spec, &SourceType::default(), &rules);
        crate::pipeline::merge_sources(vec![txns])
    }

    #[test]
    fn test_amount_columns_follow_present_categories() {
        let table = transactions_table(&ledger());
        assert_eq!(
            amount_columns(&table),
            vec!["Amount", "AmountFood", "AmountInvestments", "AmountSalary", "AmountUncategorized"]
        );
    }

    #[test]
    fn test_generate_all_writes_everything() {
        let ledger = ledger();
        let mut sink = MemorySink::default();
        let summary = generate_all(&ledger, &mut sink).unwrap();

        assert_eq!(summary.transactions, 6);
        assert_eq!(summary.expenses, 4);
        // all-time plus 2023 and 2024, nine reports each
        assert_eq!(summary.reports, 27);
        assert_eq!(sink.reports.len(), 27);

        let by_year = sink.report("expenses/h-byYear").unwrap();
        assert_eq!(
            by_year.chart_series(),
            vec![("2023".to_string(), 120.0), ("2024".to_string(), 130.0)]
        );

        let by_category = sink.report("expenses/i-byCategory").unwrap();
        assert_eq!(
            by_category.chart_series(),
            vec![("Food".to_string(), 150.0), ("Uncategorized".to_string(), 100.0)]
        );
        assert_eq!(by_category.all.get(0, "AmountFood"), Some(&Value::Float(150.0)));

        let month_2024 = sink.report("expenses/2024/d-byMonth").unwrap();
        assert_eq!(month_2024.all.len(), 2);

        assert_eq!(sink.table(INCOMES_EXPORT).unwrap().len(), 1);
        let investments = sink.table(INVESTMENTS_EXPORT).unwrap();
        assert_eq!(investments.get(0, "Type"), Some(&Value::from("Investment")));
        assert_eq!(sink.table(TRANSACTIONS_EXPORT).unwrap().len(), 6);

        assert_eq!(
            sink.lines,
            vec![(UNCATEGORIZED_LIST.to_string(), vec!["pressbyrån".to_string()])]
        );
        assert_eq!(summary.uncategorized, 1);
    }

    #[test]
    fn test_expense_reports_use_absolute_amounts() {
        let mut sink = MemorySink::default();
        generate_all(&ledger(), &mut sink).unwrap();
        let by_date = sink.report("expenses/a-byDate").unwrap();
        for (_, amount) in by_date.chart_series() {
            assert!(amount >= 0.0);
        }
        assert!(by_date.top.len() <= 25);
    }

    #[test]
    fn test_generate_all_on_empty_ledger() {
        let mut sink = MemorySink::default();
        let summary = generate_all(&[], &mut sink).unwrap();
        assert_eq!(summary.transactions, 0);
        assert_eq!(summary.reports, 9);
        assert!(sink.reports.iter().all(|(_, r)| r.all.is_empty()));
    }

    #[test]
    fn test_uncategorized_texts_distinct() {
        assert_eq!(uncategorized_texts(&ledger()), vec!["pressbyrån"]);
    }
}
