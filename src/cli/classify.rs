use std::path::Path;

use crate::categorizer::{classify, reclassify_type};
use crate::cleaner::clean_text;
use crate::error::Result;
use crate::models::{TxnType, UNCATEGORIZED};
use crate::settings::load_settings;

pub fn run(text: &str, settings_path: &Path) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let cleaned = clean_text(text);
    let category = classify(&cleaned, &settings.categorizations).unwrap_or(UNCATEGORIZED);

    println!("Text:     {cleaned}");
    println!("Category: {category}");
    // Only some categories pin the type regardless of sign.
    let pinned = reclassify_type(TxnType::Expense, category);
    if pinned != TxnType::Expense {
        println!("Type:     {pinned}");
    }
    Ok(())
}
