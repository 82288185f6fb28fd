use std::sync::OnceLock;

use regex::Regex;

use crate::calendar::calendar_fields;
use crate::models::{CleanRow, StagedRow, TxnType};

/// Card-terminal suffixes such as `M/24-05-05`.
fn terminal_stamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]?/\d{2}-\d{2}-\d{2}").expect("invalid stamp regex"))
}

/// Normalize a memo: trim, strip terminal stamps, trim again, lowercase.
///
/// Stamps are removed until none remain, so `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(raw: &str) -> String {
    let re = terminal_stamp_re();
    let mut text = raw.trim().to_string();
    while re.is_match(&text) {
        text = re.replace_all(&text, "").into_owned();
    }
    text.trim().to_lowercase()
}

/// Drop rows missing a date or an amount and normalize their text.
pub fn clean(rows: Vec<StagedRow>) -> Vec<CleanRow> {
    rows.into_iter()
        .filter_map(|row| {
            let date = row.date?;
            let amount = row.amount?;
            Some(CleanRow {
                date,
                amount,
                text: row.text.as_deref().map(clean_text),
                account: row.account,
                calendar: row.calendar.unwrap_or_else(|| calendar_fields(date)),
                txn_type: row.txn_type.unwrap_or_else(|| TxnType::from_amount(amount)),
            })
        })
        .collect()
}
