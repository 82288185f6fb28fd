use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const INVESTMENTS: &str = "Investments";
pub const TRANSFERS: &str = "Transfers";

/// A configured input file after defaults have been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub path: String,
    pub source_type: String,
    pub modifier: f64,
    pub account: String,
}

/// Reusable schema definition shared by statements of the same format.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceType {
    /// Raw column name -> canonical column name.
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default)]
    pub min_amount: Option<f64>,
    #[serde(default)]
    pub max_amount: Option<f64>,
}

impl SourceType {
    pub fn maps_to(&self, canonical: &str) -> bool {
        self.columns.values().any(|c| c == canonical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnType {
    Income,
    Expense,
    Investment,
    Transfer,
}

impl TxnType {
    /// Sign-based classification. Zero is an expense.
    pub fn from_amount(amount: f64) -> Self {
        if amount > 0.0 {
            Self::Income
        } else {
            Self::Expense
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::Investment => "Investment",
            Self::Transfer => "Transfer",
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match (month % 12 + 3) / 3 {
            1 => Self::Winter,
            2 => Self::Spring,
            3 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
        }
    }
}

/// Calendar dimensions derived from a transaction date.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarFields {
    pub year: i32,
    pub quarter_number: u32,
    pub quarter: String,
    pub season: Season,
    pub month: String,
    pub month_name: String,
    pub day_of_month: u32,
    pub week: String,
    pub week_number: u32,
    pub weekday: String,
    pub is_weekend: bool,
}

/// A row between schema mapping and cleaning. Any canonical field may still be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedRow {
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub text: Option<String>,
    pub account: String,
    pub calendar: Option<CalendarFields>,
    pub txn_type: Option<TxnType>,
}

/// A row that survived cleaning: date and amount are known.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRow {
    pub date: NaiveDate,
    pub amount: f64,
    pub text: Option<String>,
    pub account: String,
    pub calendar: CalendarFields,
    pub txn_type: TxnType,
}

/// A fully classified row of the unified ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub text: Option<String>,
    pub account: String,
    pub calendar: CalendarFields,
    pub txn_type: TxnType,
    pub category: String,
    /// One entry per known category, in category order.
    pub category_amounts: Vec<(String, f64)>,
}

impl Transaction {
    pub fn category_amount(&self, category: &str) -> Option<f64> {
        self.category_amounts
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, amount)| *amount)
    }
}

pub fn amount_column(category: &str) -> String {
    format!("Amount{category}")
}
