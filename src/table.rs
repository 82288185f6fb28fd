use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use crate::models::{amount_column, Transaction};

/// A single cell of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Date(_) => 3,
            Value::Text(_) => 4,
        }
    }
}

impl Eq for Value {}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.rank().cmp(&b.rank()),
            },
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Column-named rows. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    #[cfg(test)]
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Keep only rows whose `column` cell satisfies `keep`. Unknown columns keep nothing.
    pub fn filter_by(&self, column: &str, keep: impl Fn(&Value) -> bool) -> Table {
        let rows = match self.column_index(column) {
            Some(idx) => self.rows.iter().filter(|r| keep(&r[idx])).cloned().collect(),
            None => Vec::new(),
        };
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Replace numeric cells of the given columns with their absolute value.
    pub fn abs_columns(&mut self, columns: &[String]) {
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();
        for row in &mut self.rows {
            for &idx in &indices {
                row[idx] = match &row[idx] {
                    Value::Float(x) => Value::Float(x.abs()),
                    Value::Int(i) => Value::Int(i.abs()),
                    other => other.clone(),
                };
            }
        }
    }

    /// Distinct values of a column in first-seen order, nulls skipped.
    pub fn unique(&self, column: &str) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::new();
        if let Some(cells) = self.column(column) {
            for cell in cells {
                if !cell.is_null() && !out.contains(cell) {
                    out.push(cell.clone());
                }
            }
        }
        out
    }
}

pub const BASE_COLUMNS: &[&str] = &[
    "Date",
    "Amount",
    "Text",
    "Account",
    "Year",
    "QuarterNumber",
    "Quarter",
    "Season",
    "Month",
    "MonthName",
    "DayOfMonth",
    "Week",
    "WeekNumber",
    "Weekday",
    "IsWeekend",
    "Type",
    "Category",
];

/// Lay transactions out in the canonical column order, followed by the
/// union of their per-category amount columns.
pub fn transactions_table(txns: &[Transaction]) -> Table {
    let mut categories: Vec<&str> = Vec::new();
    for txn in txns {
        for (category, _) in &txn.category_amounts {
            if !categories.contains(&category.as_str()) {
                categories.push(category);
            }
        }
    }

    let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(categories.iter().map(|c| amount_column(c)));
    let mut table = Table::new(columns);

    for txn in txns {
        let cal = &txn.calendar;
        let mut row: Vec<Value> = vec![
            txn.date.into(),
            txn.amount.into(),
            txn.text.clone().into(),
            txn.account.clone().into(),
            i64::from(cal.year).into(),
            i64::from(cal.quarter_number).into(),
            cal.quarter.clone().into(),
            cal.season.as_str().into(),
            cal.month.clone().into(),
            cal.month_name.clone().into(),
            i64::from(cal.day_of_month).into(),
            cal.week.clone().into(),
            i64::from(cal.week_number).into(),
            cal.weekday.clone().into(),
            cal.is_weekend.into(),
            txn.txn_type.as_str().into(),
            txn.category.clone().into(),
        ];
        row.extend(categories.iter().map(|c| Value::from(txn.category_amount(c))));
        table.push_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Table {
        let mut t = Table::new(vec!["Name".into(), "Amount".into()]);
        t.push_row(vec!["a".into(), Value::Float(-2.0)]);
        t.push_row(vec!["b".into(), Value::Float(3.0)]);
        t.push_row(vec!["a".into(), Value::Int(-4)]);
        t
    }

    #[test]
    fn test_value_ordering_mixes_numbers() {
        assert!(Value::Int(2) < Value::Float(2.5));
        assert!(Value::Float(-1.0) < Value::Int(0));
        assert!(Value::Null < Value::Int(0));
        assert!(Value::Text("a".into()) < Value::Text("b".into()));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Float(-109.0).to_string(), "-109");
        assert_eq!(Value::Float(12.5).to_string(), "12.5");
        assert_eq!(Value::Null.to_string(), "");
        let d = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2024-05-05");
    }

    #[test]
    fn test_filter_and_unique() {
        let t = small();
        let only_a = t.filter_by("Name", |v| *v == Value::from("a"));
        assert_eq!(only_a.len(), 2);
        assert_eq!(t.unique("Name"), vec![Value::from("a"), Value::from("b")]);
        assert!(t.filter_by("Missing", |_| true).is_empty());
    }

    #[test]
    fn test_abs_columns() {
        let mut t = small();
        t.abs_columns(&["Amount".to_string()]);
        assert_eq!(t.get(0, "Amount"), Some(&Value::Float(2.0)));
        assert_eq!(t.get(2, "Amount"), Some(&Value::Int(4)));
        assert_eq!(t.get(0, "Name"), Some(&Value::from("a")));
    }
}
