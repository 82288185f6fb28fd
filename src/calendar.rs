use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::{CalendarFields, Season, StagedRow};

/// Derive every calendar dimension from a date. Weeks follow ISO-8601, so a
/// date near New Year may belong to a week of the adjacent year.
pub fn calendar_fields(date: NaiveDate) -> CalendarFields {
    let year = date.year();
    let month = date.month();
    let quarter_number = (month - 1) / 3 + 1;
    let iso = date.iso_week();

    CalendarFields {
        year,
        quarter_number,
        quarter: format!("{year}-Q{quarter_number}"),
        season: Season::from_month(month),
        month: date.format("%Y-%m").to_string(),
        month_name: date.format("%B").to_string(),
        day_of_month: date.day(),
        week: format!("{:04}-W{:02}", iso.year(), iso.week()),
        week_number: iso.week(),
        weekday: date.format("%A").to_string(),
        is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
    }
}

/// Attach calendar fields to every row that has a date.
pub fn enrich(rows: Vec<StagedRow>) -> Vec<StagedRow> {
    rows.into_iter()
        .map(|mut row| {
            row.calendar = row.date.map(calendar_fields);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_crossing_iso_week() {
        let cal = calendar_fields(date(2024, 12, 31));
        assert_eq!(cal.week, "2025-W01");
        assert_eq!(cal.week_number, 1);
        assert_eq!(cal.weekday, "Tuesday");
        assert_eq!(cal.year, 2024);
        assert_eq!(cal.quarter, "2024-Q4");
        assert_eq!(cal.season, Season::Winter);
    }

    #[test]
    fn test_early_january_in_previous_iso_year() {
        let cal = calendar_fields(date(2021, 1, 3));
        assert_eq!(cal.week, "2020-W53");
        assert_eq!(cal.week_number, 53);
        assert!(cal.is_weekend);
    }

    #[test]
    fn test_month_and_day_fields() {
        let cal = calendar_fields(date(2024, 5, 5));
        assert_eq!(cal.month, "2024-05");
        assert_eq!(cal.month_name, "May");
        assert_eq!(cal.day_of_month, 5);
        assert_eq!(cal.quarter_number, 2);
        assert_eq!(cal.season, Season::Spring);
        assert_eq!(cal.weekday, "Sunday");
        assert!(cal.is_weekend);
    }

    #[test]
    fn test_weekday_is_not_weekend() {
        let cal = calendar_fields(date(2024, 8, 14));
        assert_eq!(cal.weekday, "Wednesday");
        assert!(!cal.is_weekend);
        assert_eq!(cal.season, Season::Summer);
        assert_eq!(cal.week, "2024-W33");
    }

    #[test]
    fn test_enrich_skips_rows_without_date() {
        let rows = vec![
            StagedRow {
                date: Some(date(2023, 10, 1)),
                ..Default::default()
            },
            StagedRow::default(),
        ];
        let out = enrich(rows);
        assert_eq!(out[0].calendar.as_ref().map(|c| c.season), Some(Season::Autumn));
        assert!(out[1].calendar.is_none());
    }
}
