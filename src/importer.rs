use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::{Result, SpendError};
use crate::models::{SourceSpec, SourceType, StagedRow};

// ---------------------------------------------------------------------------
// Raw tables
// ---------------------------------------------------------------------------

/// A cell as it came out of the file, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Header plus data rows of one input file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// 1-based file line (or sheet row) of each data row.
    pub lines: Vec<usize>,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl RawTable {
    fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows[row].get(col).unwrap_or(&EMPTY_CELL)
    }

    fn line(&self, row: usize) -> usize {
        self.lines.get(row).copied().unwrap_or(row + 1)
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Currency codes accepted after an amount, compared case-insensitively.
const CURRENCY_SUFFIXES: &[&str] = &["sek", "kr", "eur", "usd", "gbp", "nok", "dkk", "chf"];

/// Largest serial a spreadsheet can hold (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '"' | '$' | '€' | '£' | '\u{a0}'))
        .collect();
    let lower = s.to_ascii_lowercase();
    if let Some(code) = CURRENCY_SUFFIXES.iter().find(|c| lower.ends_with(*c)) {
        s.truncate(s.len() - code.len());
    }
    s = s.replace('\u{2212}', "-");

    // The separator that comes last is the decimal point when both appear.
    s = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(_)) if s.matches(',').count() > 1 => s.replace(',', ""),
        (None, Some(_)) => s.replace(',', "."),
        (Some(_), None) if s.matches('.').count() > 1 => s.replace('.', ""),
        _ => s,
    };

    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.parse::<f64>().ok().map(|v| -v);
    }
    s.parse().ok()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d.%m.%Y", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::TimeDelta::try_days(serial.floor() as i64)?)
}

/// A numeric date cell: an 8-digit `YYYYMMDD` value or a spreadsheet serial.
fn number_to_date(n: f64) -> Option<NaiveDate> {
    if n.fract() == 0.0 && (10_000_101.0..=99_991_231.0).contains(&n) {
        return parse_date(&format!("{}", n as i64));
    }
    excel_serial_to_date(n)
}

fn coerce_date(cell: &Cell, line: usize) -> Result<Option<NaiveDate>> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Date(d) => Ok(Some(*d)),
        Cell::Number(n) => number_to_date(*n)
            .map(Some)
            .ok_or_else(|| SpendError::Parse(format!("line {line}: invalid date number {n}"))),
        Cell::Text(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| SpendError::Parse(format!("line {line}: cannot parse date '{s}'"))),
    }
}

fn coerce_amount(cell: &Cell, line: usize) -> Result<Option<f64>> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(n) => Ok(Some(*n)),
        Cell::Text(s) => parse_amount(s)
            .map(Some)
            .ok_or_else(|| SpendError::Parse(format!("line {line}: cannot parse amount '{s}'"))),
        Cell::Date(d) => Err(SpendError::Parse(format!(
            "line {line}: expected an amount, found date {d}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// File formats, dispatched on extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    #[cfg(feature = "xlsx")]
    Spreadsheet,
}

impl FileFormat {
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "xlsx")]
            "xlsx" | "xls" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(SpendError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn read(&self, path: &Path, skip_rows: usize) -> Result<RawTable> {
        match self {
            Self::Csv => read_csv(path, skip_rows),
            #[cfg(feature = "xlsx")]
            Self::Spreadsheet => read_spreadsheet(path, skip_rows),
        }
    }
}

pub fn read_table(path: &Path, skip_rows: usize) -> Result<RawTable> {
    FileFormat::detect(path)?.read(path, skip_rows)
}

fn read_csv(path: &Path, skip_rows: usize) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let mut records = rdr.records().skip(skip_rows);
    let Some(header) = records.next() else {
        return Ok(RawTable::default());
    };
    let headers = header?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    let mut lines = Vec::new();
    for result in records {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        lines.push(record.position().map_or(0, |p| p.line() as usize));
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(RawTable {
        headers,
        rows,
        lines,
    })
}

#[cfg(feature = "xlsx")]
fn read_spreadsheet(path: &Path, skip_rows: usize) -> Result<RawTable> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| SpendError::Xlsx(format!("failed to open {}: {e}", path.display())))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SpendError::Xlsx(format!("no sheets in {}", path.display())))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| SpendError::Xlsx(e.to_string()))?;

    let to_cell = |data: &Data| -> Cell {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::from_text(s),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).map_or(Cell::Empty, Cell::Date),
            other => Cell::from_text(&other.to_string()),
        }
    };

    // `rows()` starts at the first used row, not at row 0.
    let first_used = range.start().map_or(0, |(row, _)| row as usize);
    let skipped = skip_rows.saturating_sub(first_used);
    let mut rows_iter = range
        .rows()
        .enumerate()
        .skip(skipped)
        .map(|(i, row)| (first_used + i + 1, row));
    let Some((_, header)) = rows_iter.next() else {
        return Ok(RawTable::default());
    };
    let headers = header.iter().map(|h| h.to_string().trim().to_string()).collect();

    let mut rows = Vec::new();
    let mut lines = Vec::new();
    for (line, row) in rows_iter {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        lines.push(line);
        rows.push(row.iter().map(to_cell).collect());
    }
    Ok(RawTable {
        headers,
        rows,
        lines,
    })
}

// ---------------------------------------------------------------------------
// Schema mapping
// ---------------------------------------------------------------------------

/// Rename raw columns to canonical names and drop everything the source
/// type does not map. An explicitly mapped column wins over a raw column that
/// already carries the canonical name; otherwise the first column wins.
pub fn map_columns(raw: &RawTable, source_type: &SourceType) -> RawTable {
    for raw_name in source_type.columns.keys() {
        if !raw.headers.contains(raw_name) {
            warn!(column = %raw_name, "mapped column not found in file");
        }
    }

    let mut keep: Vec<(usize, String)> = Vec::new();
    for explicit in [true, false] {
        for (idx, header) in raw.headers.iter().enumerate() {
            let canonical = match source_type.columns.get(header) {
                Some(c) if explicit => c.clone(),
                None if !explicit => header.clone(),
                _ => continue,
            };
            if source_type.maps_to(&canonical) && !keep.iter().any(|(_, c)| *c == canonical) {
                keep.push((idx, canonical));
            }
        }
    }
    keep.sort_by_key(|(idx, _)| *idx);

    let headers = keep.iter().map(|(_, c)| c.clone()).collect();
    let rows = (0..raw.rows.len())
        .map(|r| keep.iter().map(|(idx, _)| raw.cell(r, *idx).clone()).collect())
        .collect();
    RawTable {
        headers,
        rows,
        lines: raw.lines.clone(),
    }
}

/// Fail when the source type maps a column onto `Date` or `Amount` but no
/// file column ends up with that name.
fn require_mapped(mapped: &RawTable, source_type: &SourceType, path: &str) -> Result<()> {
    for canonical in ["Date", "Amount"] {
        if source_type.maps_to(canonical) && !mapped.headers.iter().any(|h| h == canonical) {
            let expected: Vec<&str> = source_type
                .columns
                .iter()
                .filter(|(_, c)| *c == canonical)
                .map(|(raw, _)| raw.as_str())
                .collect();
            return Err(SpendError::Schema(format!(
                "{path}: no column for {canonical} (expected {})",
                expected.join(" or ")
            )));
        }
    }
    Ok(())
}

/// Coerce a mapped table into staged rows. `Date` and `Amount` cells must be
/// convertible; errors name the file line of the offending row.
pub fn stage_rows(mapped: &RawTable, default_account: &str) -> Result<Vec<StagedRow>> {
    let col = |name: &str| mapped.headers.iter().position(|h| h == name);
    let (date_col, amount_col, text_col, account_col) =
        (col("Date"), col("Amount"), col("Text"), col("Account"));

    let mut rows = Vec::with_capacity(mapped.rows.len());
    for r in 0..mapped.rows.len() {
        let line = mapped.line(r);
        let date = match date_col {
            Some(c) => coerce_date(mapped.cell(r, c), line)?,
            None => None,
        };
        let amount = match amount_col {
            Some(c) => coerce_amount(mapped.cell(r, c), line)?,
            None => None,
        };
        let text = text_col.and_then(|c| mapped.cell(r, c).as_text());
        let account = account_col
            .and_then(|c| mapped.cell(r, c).as_text())
            .unwrap_or_else(|| default_account.to_string());
        rows.push(StagedRow {
            date,
            amount,
            text,
            account,
            ..Default::default()
        });
    }
    Ok(rows)
}

/// Read one source file and bring it into the canonical schema.
pub fn import_source(spec: &SourceSpec, source_type: &SourceType, path: &Path) -> Result<Vec<StagedRow>> {
    let raw = read_table(path, source_type.skip_rows)?;
    debug!(source = %spec.path, rows = raw.rows.len(), columns = ?raw.headers, "read source file");
    let mapped = map_columns(&raw, source_type);
    require_mapped(&mapped, source_type, &spec.path)?;
    stage_rows(&mapped, &spec.account)
}
