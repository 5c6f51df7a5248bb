//! Date-likeness classification
//!
//! Decides whether a text column holds calendar dates. The parse is strict at
//! the column level: one value that no known layout accepts disqualifies the
//! whole column. Classification never modifies the table; converting the
//! suggested columns is a separate step (see `cleaning::convert_to_dates`).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::types::{Column, ColumnType, ColumnValue, Table};

/// Datetime layouts; the time of day is dropped after parsing
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, most common first. Month-first wins over day-first for
/// ambiguous slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Parse a single value as a calendar date using any known layout
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // Compact %Y%m%d would otherwise accept any 8-digit number
    let compact_only_digits = s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit());
    for fmt in DATE_FORMATS {
        if *fmt == "%Y%m%d" && !compact_only_digits {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    None
}

/// Reinterpret a column as dates, or `None` if any non-missing value does
/// not parse. Date columns come back unchanged; numeric columns are never
/// dates.
pub fn coerce_to_date_or_none(values: &ColumnValue) -> Option<Vec<Option<NaiveDate>>> {
    match values {
        ColumnValue::Date(dates) => Some(dates.clone()),
        ColumnValue::Text(texts) => texts
            .iter()
            .map(|cell| match cell {
                None => Some(None),
                Some(s) => parse_date(s).map(Some),
            })
            .collect(),
        ColumnValue::Integer(_) | ColumnValue::Float(_) => None,
    }
}

/// A text column with at least one value, all of whose values parse as dates
pub fn is_date_like(column: &Column) -> bool {
    if column.column_type() != ColumnType::Text {
        return false;
    }
    match coerce_to_date_or_none(&column.values) {
        Some(dates) => dates.iter().any(Option::is_some),
        None => false,
    }
}

/// Names of the columns that could be converted to dates, in table order
pub fn list_date_like_columns(table: &Table) -> Vec<String> {
    let names: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| is_date_like(c))
        .map(|c| c.name.clone())
        .collect();
    debug!(candidates = ?names, "date-like columns");
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[Option<&str>]) -> ColumnValue {
        ColumnValue::Text(values.iter().map(|v| v.map(str::to_string)).collect())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_date("2021-01-01"), Some(ymd(2021, 1, 1)));
        assert_eq!(parse_date("  2021-02-28  "), Some(ymd(2021, 2, 28)));
    }

    #[test]
    fn test_parse_datetime_drops_time() {
        assert_eq!(parse_date("2019-03-05 14:30:00"), Some(ymd(2019, 3, 5)));
        assert_eq!(parse_date("2019-03-05T14:30:00"), Some(ymd(2019, 3, 5)));
        assert_eq!(
            parse_date("2019-03-05T23:30:00+02:00"),
            Some(ymd(2019, 3, 5))
        );
    }

    #[test]
    fn test_parse_other_layouts() {
        assert_eq!(parse_date("03/15/2020"), Some(ymd(2020, 3, 15)));
        assert_eq!(parse_date("15/03/2020"), Some(ymd(2020, 3, 15)));
        assert_eq!(parse_date("15.03.2020"), Some(ymd(2020, 3, 15)));
        assert_eq!(parse_date("Mar 15, 2020"), Some(ymd(2020, 3, 15)));
        assert_eq!(parse_date("20200315"), Some(ymd(2020, 3, 15)));
    }

    #[test]
    fn test_parse_rejects_non_dates() {
        assert_eq!(parse_date("ford"), None);
        assert_eq!(parse_date("2021-13-01"), None);
        assert_eq!(parse_date("12345"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_coerce_skips_missing() {
        let values = text(&[Some("2021-01-01"), None]);
        assert_eq!(
            coerce_to_date_or_none(&values),
            Some(vec![Some(ymd(2021, 1, 1)), None])
        );
    }

    #[test]
    fn test_coerce_single_failure_is_none() {
        let values = text(&[Some("2021-01-01"), Some("sedan")]);
        assert_eq!(coerce_to_date_or_none(&values), None);
    }

    #[test]
    fn test_coerce_numeric_is_none() {
        let values = ColumnValue::Integer(vec![Some(20210101)]);
        assert_eq!(coerce_to_date_or_none(&values), None);
    }

    #[test]
    fn test_is_date_like() {
        let dates = Column::new("date_posted", text(&[Some("2018-06-23"), Some("2019-01-19")]));
        let models = Column::new("model", text(&[Some("bmw x5"), Some("ford f-150")]));
        let empty = Column::new("blank", text(&[None, None]));
        let typed = Column::new("posted", ColumnValue::Date(vec![Some(ymd(2020, 1, 1))]));

        assert!(is_date_like(&dates));
        assert!(!is_date_like(&models));
        assert!(!is_date_like(&empty));
        assert!(!is_date_like(&typed));
    }

    #[test]
    fn test_is_date_like_is_idempotent() {
        let column = Column::new("d", text(&[Some("2018-06-23"), None]));
        let before = column.clone();
        assert_eq!(is_date_like(&column), is_date_like(&column));
        assert_eq!(column, before);
    }

    #[test]
    fn test_list_date_like_columns_in_table_order() {
        let table = Table::from_columns(vec![
            Column::new("price", ColumnValue::Integer(vec![Some(9400), Some(25500)])),
            Column::new("date_posted", text(&[Some("2018-06-23"), Some("2018-10-19")])),
            Column::new("model", text(&[Some("bmw x5"), Some("ford f-150")])),
            Column::new("last_seen", text(&[Some("2018-07-09"), None])),
        ])
        .unwrap();

        assert_eq!(
            list_date_like_columns(&table),
            vec!["date_posted".to_string(), "last_seen".to_string()]
        );
    }
}
