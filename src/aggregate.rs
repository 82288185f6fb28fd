use std::collections::BTreeMap;

use crate::error::{Result, SpendError};
use crate::table::{Table, Value};

pub const TOP_N: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Sum,
    First,
}

/// Ordered column -> summary operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationMapping {
    ops: Vec<(String, AggOp)>,
}

impl AggregationMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the operation for a column.
    pub fn with(mut self, column: impl Into<String>, op: AggOp) -> Self {
        let column = column.into();
        match self.ops.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = op,
            None => self.ops.push((column, op)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AggOp)> {
        self.ops.iter().map(|(c, op)| (c.as_str(), *op))
    }

    pub fn columns_with(&self, op: AggOp) -> Vec<String> {
        self.iter()
            .filter(|(_, o)| *o == op)
            .map(|(c, _)| c.to_string())
            .collect()
    }
}

/// A full aggregate and its top-N subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub dimension: String,
    pub all: Table,
    pub top: Table,
}

impl Report {
    /// Ordered (dimension value, summed amount) pairs for a bar chart.
    pub fn chart_series(&self) -> Vec<(String, f64)> {
        let (Some(dims), Some(amounts)) = (self.all.column(&self.dimension), self.all.column("Amount"))
        else {
            return Vec::new();
        };
        dims.into_iter()
            .zip(amounts)
            .map(|(d, a)| (d.to_string(), a.as_f64().unwrap_or(0.0)))
            .collect()
    }
}

fn sum_cells(column: &str, cells: &[&Value]) -> Result<Value> {
    let mut int_sum: i64 = 0;
    let mut float_sum: f64 = 0.0;
    let mut saw_float = false;
    for cell in cells {
        match cell {
            Value::Null => {}
            Value::Int(i) => int_sum += i,
            Value::Bool(b) => int_sum += i64::from(*b),
            Value::Float(f) => {
                float_sum += f;
                saw_float = true;
            }
            other => {
                return Err(SpendError::Schema(format!(
                    "cannot sum non-numeric value '{other}' in column '{column}'"
                )))
            }
        }
    }
    Ok(if saw_float {
        Value::Float(float_sum + int_sum as f64)
    } else {
        Value::Int(int_sum)
    })
}

fn first_cell(cells: &[&Value]) -> Value {
    cells
        .iter()
        .find(|c| !c.is_null())
        .map_or(Value::Null, |c| (*c).clone())
}

/// Group rows by `by`, one output row per distinct non-null value in
/// ascending order. Output columns are `by` followed by the mapped columns
/// (the grouping column itself is never aggregated).
pub fn aggregate(table: &Table, by: &str, mapping: &AggregationMapping) -> Result<Table> {
    let by_idx = table
        .column_index(by)
        .ok_or_else(|| SpendError::Schema(format!("grouping column '{by}' not found")))?;

    let mut plan: Vec<(String, usize, AggOp)> = Vec::new();
    for (column, op) in mapping.iter().filter(|(c, _)| *c != by) {
        let idx = table
            .column_index(column)
            .ok_or_else(|| SpendError::Schema(format!("aggregated column '{column}' not found")))?;
        plan.push((column.to_string(), idx, op));
    }

    let mut groups: BTreeMap<&Value, Vec<&Vec<Value>>> = BTreeMap::new();
    for row in &table.rows {
        let key = &row[by_idx];
        if !key.is_null() {
            groups.entry(key).or_default().push(row);
        }
    }

    let mut columns = vec![by.to_string()];
    columns.extend(plan.iter().map(|(c, _, _)| c.clone()));
    let mut out = Table::new(columns);

    for (key, rows) in groups {
        let mut cells = vec![key.clone()];
        for (column, idx, op) in &plan {
            let values: Vec<&Value> = rows.iter().map(|r| &r[*idx]).collect();
            cells.push(match op {
                AggOp::Sum => sum_cells(column, &values)?,
                AggOp::First => first_cell(&values),
            });
        }
        out.push_row(cells);
    }
    Ok(out)
}

/// The `n` rows with the largest numeric `column`, largest first. Equal
/// values keep their input order; non-numeric cells are skipped.
pub fn top_n(table: &Table, n: usize, column: &str) -> Result<Table> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| SpendError::Schema(format!("column '{column}' not found")))?;

    let mut ranked: Vec<(f64, &Vec<Value>)> = table
        .rows
        .iter()
        .filter_map(|r| r[idx].as_f64().map(|v| (v, r)))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    Ok(Table {
        columns: table.columns.clone(),
        rows: ranked.into_iter().take(n).map(|(_, r)| r.clone()).collect(),
    })
}

pub fn aggregate_report(table: &Table, by: &str, mapping: &AggregationMapping) -> Result<Report> {
    let all = aggregate(table, by, mapping)?;
    let top = top_n(&all, TOP_N, "Amount")?;
    Ok(Report {
        dimension: by.to_string(),
        all,
        top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ledger() -> Table {
        let mut t = Table::new(vec![
            "Date".into(),
            "Year".into(),
            "Month".into(),
            "Amount".into(),
            "AmountFood".into(),
        ]);
        let rows = [
            ((2024, 3, 1), -10.0, -10.0),
            ((2024, 3, 1), -5.0, 0.0),
            ((2023, 12, 24), -7.5, -7.5),
            ((2024, 1, 15), 100.0, 0.0),
            ((2023, 11, 2), -2.5, 0.0),
        ];
        for ((y, m, d), amount, food) in rows {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            t.push_row(vec![
                date.into(),
                Value::Int(i64::from(y)),
                format!("{y}-{m:02}").into(),
                amount.into(),
                food.into(),
            ]);
        }
        t
    }

    fn mapping() -> AggregationMapping {
        AggregationMapping::new()
            .with("Amount", AggOp::Sum)
            .with("AmountFood", AggOp::Sum)
            .with("Year", AggOp::First)
            .with("Month", AggOp::First)
    }

    #[test]
    fn test_aggregate_by_year() {
        let out = aggregate(&ledger(), "Year", &mapping()).unwrap();
        assert_eq!(out.columns, vec!["Year", "Amount", "AmountFood", "Month"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(0, "Year"), Some(&Value::Int(2023)));
        assert_eq!(out.get(0, "Amount"), Some(&Value::Float(-10.0)));
        assert_eq!(out.get(1, "Amount"), Some(&Value::Float(85.0)));
        assert_eq!(out.get(1, "AmountFood"), Some(&Value::Float(-10.0)));
        assert_eq!(out.get(1, "Month"), Some(&Value::from("2024-03")));
    }

    #[test]
    fn test_aggregate_by_date_sorted_ascending() {
        let out = aggregate(&ledger(), "Date", &mapping()).unwrap();
        assert_eq!(out.len(), 4);
        let dates = out.column("Date").unwrap();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(out.get(3, "Amount"), Some(&Value::Float(-15.0)));
    }

    #[test]
    fn test_aggregate_missing_columns_fail() {
        assert!(matches!(
            aggregate(&ledger(), "Week", &mapping()),
            Err(SpendError::Schema(_))
        ));
        let bad = mapping().with("AmountFun", AggOp::Sum);
        assert!(matches!(aggregate(&ledger(), "Year", &bad), Err(SpendError::Schema(_))));
    }

    #[test]
    fn test_sum_rejects_text() {
        let bad = AggregationMapping::new().with("Month", AggOp::Sum);
        assert!(aggregate(&ledger(), "Year", &bad).is_err());
    }

    #[test]
    fn test_top_n_subset_sorted_descending() {
        let mut t = Table::new(vec!["Key".into(), "Amount".into()]);
        for i in 0..40i64 {
            t.push_row(vec![Value::Int(i), Value::Float(((i * 7) % 13) as f64)]);
        }
        let top = top_n(&t, TOP_N, "Amount").unwrap();
        assert_eq!(top.len(), 25);
        let amounts: Vec<f64> = top.column("Amount").unwrap().iter().filter_map(|v| v.as_f64()).collect();
        assert!(amounts.windows(2).all(|w| w[0] >= w[1]));
        for row in &top.rows {
            assert!(t.rows.contains(row));
        }
    }

    #[test]
    fn test_top_n_with_few_rows_and_stable_ties() {
        let mut t = Table::new(vec!["Key".into(), "Amount".into()]);
        t.push_row(vec!["a".into(), Value::Float(1.0)]);
        t.push_row(vec!["b".into(), Value::Float(3.0)]);
        t.push_row(vec!["c".into(), Value::Float(1.0)]);
        let top = top_n(&t, TOP_N, "Amount").unwrap();
        let keys: Vec<String> = top.column("Key").unwrap().iter().map(|v| v.to_string()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_report_chart_series() {
        let report = aggregate_report(&ledger(), "Year", &mapping()).unwrap();
        assert_eq!(
            report.chart_series(),
            vec![("2023".to_string(), -10.0), ("2024".to_string(), 85.0)]
        );
        assert_eq!(report.top.len(), 2);
        assert_eq!(report.top.get(0, "Year"), Some(&Value::Int(2024)));
    }

    #[test]
    fn test_mapping_with_replaces_op() {
        let m = AggregationMapping::new()
            .with("Amount", AggOp::First)
            .with("Amount", AggOp::Sum);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![("Amount", AggOp::Sum)]);
        assert_eq!(m.columns_with(AggOp::Sum), vec!["Amount"]);
    }
}
