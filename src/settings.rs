use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::categorizer::CategoryRules;
use crate::error::{Result, SpendError};
use crate::models::{SourceSpec, SourceType};

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_MODIFIER: f64 = 1.0;
pub const DEFAULT_ACCOUNT: &str = "Default";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub sources: Vec<RawSource>,
    #[serde(default)]
    pub source_types: BTreeMap<String, SourceType>,
    #[serde(default)]
    pub categorizations: CategoryRules,
}

/// A source entry as written in the settings file, before defaults are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub modifier: Option<f64>,
    pub account: Option<String>,
}

impl Settings {
    pub fn source_type(&self, name: &str) -> Result<&SourceType> {
        let st = self
            .source_types
            .get(name)
            .ok_or_else(|| SpendError::Schema(format!("unknown source type '{name}'")))?;
        if st.columns.is_empty() {
            return Err(SpendError::Schema(format!(
                "source type '{name}' has no column mapping"
            )));
        }
        Ok(st)
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Validate a raw source and fill in `modifier` and `account` when absent.
pub fn normalize_source(raw: &RawSource) -> Result<SourceSpec> {
    let path = raw
        .path
        .clone()
        .ok_or_else(|| SpendError::Config("source must have a path".to_string()))?;
    let source_type = raw
        .source_type
        .clone()
        .ok_or_else(|| SpendError::Config(format!("source '{path}' must have a type")))?;

    let modifier = raw.modifier.unwrap_or_else(|| {
        warn!(source = %path, "no modifier found, using default value {DEFAULT_MODIFIER}");
        DEFAULT_MODIFIER
    });
    let account = raw.account.clone().unwrap_or_else(|| {
        warn!(source = %path, "no account found, using default value {DEFAULT_ACCOUNT}");
        DEFAULT_ACCOUNT.to_string()
    });

    Ok(SourceSpec {
        path,
        source_type,
        modifier,
        account,
    })
}

pub fn shellexpand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(path: Option<&str>, ty: Option<&str>) -> RawSource {
        RawSource {
            path: path.map(String::from),
            source_type: ty.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let spec = normalize_source(&raw(Some("a.csv"), Some("bank"))).unwrap();
        assert_eq!(spec.modifier, 1.0);
        assert_eq!(spec.account, "Default");
        assert_eq!(spec.source_type, "bank");
    }

    #[test]
    fn test_normalize_keeps_given_values() {
        let mut r = raw(Some("a.csv"), Some("bank"));
        r.modifier = Some(-1.0);
        r.account = Some("Card".to_string());
        let spec = normalize_source(&r).unwrap();
        assert_eq!(spec.modifier, -1.0);
        assert_eq!(spec.account, "Card");
    }

    #[test]
    fn test_normalize_requires_path_and_type() {
        assert!(matches!(
            normalize_source(&raw(None, Some("bank"))),
            Err(SpendError::Config(_))
        ));
        assert!(matches!(
            normalize_source(&raw(Some("a.csv"), None)),
            Err(SpendError::Config(_))
        ));
    }

    #[test]
    fn test_load_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let json = r#"{
            "sources": [{"path": "bank.csv", "type": "seb", "account": "Checking"}],
            "sourceTypes": {
                "seb": {"columns": {"Datum": "Date", "Text": "Text", "Belopp": "Amount"}, "skipRows": 1}
            },
            "categorizations": {"Subscriptions": ["netflix", "spotify"], "Food": ["ica"]}
        }"#;
        std::fs::write(&path, json).unwrap();
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.sources.len(), 1);
        assert_eq!(settings.sources[0].account.as_deref(), Some("Checking"));
        let st = settings.source_type("seb").unwrap();
        assert_eq!(st.skip_rows, 1);
        assert_eq!(st.columns["Belopp"], "Amount");
        let names: Vec<&str> = settings.categorizations.names().collect();
        assert_eq!(names, vec!["Subscriptions", "Food"]);
    }

    #[test]
    fn test_unknown_source_type_is_schema_error() {
        let settings = Settings::default();
        assert!(matches!(settings.source_type("nope"), Err(SpendError::Schema(_))));
    }

    #[test]
    fn test_source_type_without_columns_is_schema_error() {
        let mut settings = Settings::default();
        settings
            .source_types
            .insert("empty".to_string(), SourceType::default());
        assert!(matches!(settings.source_type("empty"), Err(SpendError::Schema(_))));
    }

    #[test]
    fn test_shellexpand_plain_path_unchanged() {
        assert_eq!(shellexpand_path("data/a.csv"), PathBuf::from("data/a.csv"));
    }
}
