use serde::Deserialize;

use crate::models::{CleanRow, Transaction, TxnType, INVESTMENTS, TRANSFERS, UNCATEGORIZED};

/// Ordered category -> keywords rules. Earlier categories win.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct CategoryRules {
    rules: Vec<(String, Vec<String>)>,
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for CategoryRules {
    type Error = String;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let mut rules = Vec::with_capacity(map.len());
        for (category, value) in map {
            let keywords = value
                .as_array()
                .ok_or_else(|| format!("keywords for '{category}' must be a list"))?
                .iter()
                .map(|k| {
                    k.as_str()
                        .map(String::from)
                        .ok_or_else(|| format!("keyword for '{category}' must be a string"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            rules.push((category, keywords));
        }
        Ok(Self { rules })
    }
}

impl CategoryRules {
    pub fn new(rules: Vec<(String, Vec<String>)>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.rules.iter().map(|(c, k)| (c.as_str(), k.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(c, _)| c.as_str())
    }

    /// Every category a row can end up in: rule keys, then `Uncategorized`.
    pub fn all_categories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.rules.len() + 1);
        for name in self.names().chain(std::iter::once(UNCATEGORIZED)) {
            if !out.iter().any(|c| c == name) {
                out.push(name.to_string());
            }
        }
        out
    }
}

/// First category whose keyword list has a substring of `text`.
pub fn classify<'a>(text: &str, rules: &'a CategoryRules) -> Option<&'a str> {
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
        .map(|(category, _)| category)
}

pub struct CategorizeResult {
    pub transactions: Vec<Transaction>,
    pub categorized: usize,
    pub uncategorized: usize,
}

/// Assign a category to every row. Rows without text or without a matching
/// keyword fall into `Uncategorized`.
pub fn categorize(rows: Vec<CleanRow>, rules: &CategoryRules) -> CategorizeResult {
    let mut categorized = 0usize;
    let mut uncategorized = 0usize;

    let transactions = rows
        .into_iter()
        .map(|row| {
            let matched = row.text.as_deref().and_then(|t| classify(t, rules));
            let category = match matched {
                Some(c) => {
                    categorized += 1;
                    c.to_string()
                }
                None => {
                    uncategorized += 1;
                    UNCATEGORIZED.to_string()
                }
            };
            Transaction {
                date: row.date,
                amount: row.amount,
                text: row.text,
                account: row.account,
                calendar: row.calendar,
                txn_type: row.txn_type,
                category,
                category_amounts: Vec::new(),
            }
        })
        .collect();

    CategorizeResult {
        transactions,
        categorized,
        uncategorized,
    }
}

/// Investments and transfers override the sign-based type.
pub fn reclassify_type(base: TxnType, category: &str) -> TxnType {
    match category {
        INVESTMENTS => TxnType::Investment,
        TRANSFERS => TxnType::Transfer,
        _ => base,
    }
}

pub fn reclassify(transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions
        .into_iter()
        .map(|mut txn| {
            txn.txn_type = reclassify_type(txn.txn_type, &txn.category);
            txn
        })
        .collect()
}

/// Give each row one amount per category: the full amount under its own
/// category and zero everywhere else.
pub fn expand_category_amounts(
    transactions: Vec<Transaction>,
    categories: &[String],
) -> Vec<Transaction> {
    transactions
        .into_iter()
        .map(|mut txn| {
            txn.category_amounts = categories
                .iter()
                .map(|c| {
                    let amount = if *c == txn.category { txn.amount } else { 0.0 };
                    (c.clone(), amount)
                })
                .collect();
            txn
        })
        .collect()
}
