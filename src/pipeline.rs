use tracing::{debug, info};

use crate::calendar;
use crate::categorizer::{self, CategoryRules};
use crate::cleaner;
use crate::error::Result;
use crate::importer;
use crate::models::{CleanRow, SourceSpec, SourceType, StagedRow, Transaction, TxnType};
use crate::settings::{normalize_source, shellexpand_path, Settings};

/// Sign-based Income/Expense for every row that has an amount.
pub fn classify_amounts(rows: Vec<StagedRow>) -> Vec<StagedRow> {
    rows.into_iter()
        .map(|mut row| {
            row.txn_type = row.amount.map(TxnType::from_amount);
            row
        })
        .collect()
}

pub fn apply_modifier(rows: Vec<CleanRow>, modifier: f64) -> Vec<CleanRow> {
    rows.into_iter()
        .map(|mut row| {
            row.amount *= modifier;
            row
        })
        .collect()
}

/// Keep rows inside the source type's inclusive `[minAmount, maxAmount]`.
/// Either bound may be absent.
pub fn filter_range(rows: Vec<CleanRow>, source_type: &SourceType) -> Vec<CleanRow> {
    let min = source_type.min_amount.unwrap_or(f64::NEG_INFINITY);
    let max = source_type.max_amount.unwrap_or(f64::INFINITY);
    rows.into_iter()
        .filter(|row| row.amount >= min && row.amount <= max)
        .collect()
}

/// Run every per-source stage after the file has been mapped into staged rows.
pub fn transform_source(
    staged: Vec<StagedRow>,
    spec: &SourceSpec,
    source_type: &SourceType,
    rules: &CategoryRules,
) -> Vec<Transaction> {
    let read = staged.len();
    let rows = calendar::enrich(staged);
    let rows = classify_amounts(rows);
    let rows = cleaner::clean(rows);
    let cleaned = rows.len();
    let rows = apply_modifier(rows, spec.modifier);
    let rows = filter_range(rows, source_type);
    debug!(
        source = %spec.path,
        dropped_incomplete = read - cleaned,
        dropped_out_of_range = cleaned - rows.len(),
        "cleaned source rows"
    );

    let result = categorizer::categorize(rows, rules);
    info!(
        source = %spec.path,
        account = %spec.account,
        categorized = result.categorized,
        uncategorized = result.uncategorized,
        "processed source"
    );
    let txns = categorizer::reclassify(result.transactions);
    categorizer::expand_category_amounts(txns, &rules.all_categories())
}

/// Load and transform one source from disk.
pub fn load_source(spec: &SourceSpec, settings: &Settings) -> Result<Vec<Transaction>> {
    let source_type = settings.source_type(&spec.source_type)?;
    let path = shellexpand_path(&spec.path);
    let staged = importer::import_source(spec, source_type, &path)?;
    Ok(transform_source(staged, spec, source_type, &settings.categorizations))
}

/// Concatenate per-source results and order by date, newest first. Rows with
/// the same date keep their source order.
pub fn merge_sources(parts: Vec<Vec<Transaction>>) -> Vec<Transaction> {
    let mut merged: Vec<Transaction> = parts.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.date.cmp(&a.date));
    merged
}

/// Process every configured source in order and merge the results. The
/// first failing source aborts the run.
pub fn load_ledger(settings: &Settings) -> Result<Vec<Transaction>> {
    let mut parts = Vec::with_capacity(settings.sources.len());
    for raw in &settings.sources {
        let spec = normalize_source(raw)?;
        parts.push(load_source(&spec, settings)?);
    }
    let merged = merge_sources(parts);
    info!(sources = settings.sources.len(), transactions = merged.len(), "merged sources");
    Ok(merged)
}
