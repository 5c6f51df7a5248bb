//! Formula evaluator
//!
//! Evaluates an AST against a table, producing one value per row. Literals
//! are broadcast to the table's row count; a missing cell on either side of
//! an operation yields a missing result.

use chrono::{Days, NaiveDate};

use super::coercion::{CoercedAdd, CoercionRule};
use super::parser::Expr;
use crate::core::dates::coerce_to_date_or_none;
use crate::error::{FormulaError, FormulaResult};
use crate::types::{ColumnValue, Table};

/// Largest day offset accepted before the date arithmetic is attempted
const MAX_DAY_OFFSET: f64 = 100_000_000.0;

/// Evaluate an expression row-wise over `table`
pub fn evaluate(expr: &Expr, table: &Table) -> FormulaResult<ColumnValue> {
    let rows = table.row_count();
    match expr {
        Expr::Integer(n) => Ok(ColumnValue::Integer(vec![Some(*n); rows])),
        Expr::Float(n) => Ok(ColumnValue::Float(vec![Some(*n); rows])),
        Expr::Text(s) => Ok(ColumnValue::Text(vec![Some(s.clone()); rows])),
        Expr::Column(name) => column_values(table, name).cloned(),
        Expr::Add { left, right } => {
            let left = evaluate(left, table)?;
            let right = evaluate(right, table)?;
            add_values(left, right)
        }
        Expr::Coerced(coerced) => evaluate_coerced(coerced, table),
    }
}

fn column_values<'a>(table: &'a Table, name: &str) -> FormulaResult<&'a ColumnValue> {
    table
        .column(name)
        .map(|c| &c.values)
        .ok_or_else(|| FormulaError::UnresolvedReference(name.to_string()))
}

fn incompatible(left: &ColumnValue, right: &ColumnValue) -> FormulaError {
    FormulaError::IncompatibleOperands {
        left: left.column_type().to_string(),
        right: right.column_type().to_string(),
    }
}

/// Plain `+`: numeric addition only
fn add_values(left: ColumnValue, right: ColumnValue) -> FormulaResult<ColumnValue> {
    match (&left, &right) {
        (ColumnValue::Integer(a), ColumnValue::Integer(b)) => {
            let mut out = Vec::with_capacity(a.len());
            for (row, (x, y)) in a.iter().zip(b).enumerate() {
                let sum = match (x, y) {
                    (Some(x), Some(y)) => Some(x.checked_add(*y).ok_or_else(|| {
                        FormulaError::Evaluation(format!("Integer overflow in row {}", row))
                    })?),
                    _ => None,
                };
                out.push(sum);
            }
            Ok(ColumnValue::Integer(out))
        }
        _ => match (left.to_f64(), right.to_f64()) {
            (Some(a), Some(b)) => Ok(ColumnValue::Float(
                a.iter()
                    .zip(&b)
                    .map(|(x, y)| Some((*x)? + (*y)?))
                    .collect(),
            )),
            _ => Err(incompatible(&left, &right)),
        },
    }
}

fn evaluate_coerced(coerced: &CoercedAdd, table: &Table) -> FormulaResult<ColumnValue> {
    let left = column_values(table, &coerced.left)?;
    let right = column_values(table, &coerced.right)?;

    match coerced.rule {
        CoercionRule::ParsedDatePlusDays | CoercionRule::DatePlusDays => {
            let dates = coerce_to_date_or_none(left).ok_or_else(|| {
                FormulaError::ParseFailure(format!(
                    "column '{}' does not parse as dates",
                    coerced.left
                ))
            })?;
            let offsets = right.to_f64().ok_or_else(|| incompatible(left, right))?;
            add_days(&dates, &offsets).map(ColumnValue::Date)
        }
        CoercionRule::TextPlusNumber | CoercionRule::NumberPlusText => {
            Ok(ColumnValue::Text(concat(&to_text(left), &to_text(right))))
        }
    }
}

/// Add whole-day offsets; fractional days are truncated toward zero
fn add_days(
    dates: &[Option<NaiveDate>],
    offsets: &[Option<f64>],
) -> FormulaResult<Vec<Option<NaiveDate>>> {
    dates
        .iter()
        .zip(offsets)
        .enumerate()
        .map(|(row, pair)| match pair {
            (Some(date), Some(days)) => shift_date(*date, *days, row).map(Some),
            _ => Ok(None),
        })
        .collect()
}

fn shift_date(date: NaiveDate, days: f64, row: usize) -> FormulaResult<NaiveDate> {
    if !days.is_finite() {
        return Err(FormulaError::ParseFailure(format!(
            "day offset '{}' in row {} is not a finite number",
            days, row
        )));
    }
    let days = days.trunc();
    let shifted = if days.abs() > MAX_DAY_OFFSET {
        None
    } else if days >= 0.0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new((-days) as u64))
    };
    shifted.ok_or_else(|| {
        FormulaError::Evaluation(format!(
            "{} + {} days in row {} is out of the supported date range",
            date, days, row
        ))
    })
}

fn to_text(values: &ColumnValue) -> Vec<Option<String>> {
    (0..values.len()).map(|row| values.display_cell(row)).collect()
}

fn concat(left: &[Option<String>], right: &[Option<String>]) -> Vec<Option<String>> {
    left.iter()
        .zip(right)
        .map(|pair| match pair {
            (Some(a), Some(b)) => Some(format!("{}{}", a, b)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn table() -> Table {
        Table::from_columns(vec![
            Column::new("p", ColumnValue::Integer(vec![Some(2), Some(3)])),
            Column::new("q", ColumnValue::Integer(vec![Some(10), None])),
            Column::new("f", ColumnValue::Float(vec![Some(0.5), Some(1.5)])),
            Column::new(
                "s",
                ColumnValue::Text(vec![Some("car-".to_string()), Some("van-".to_string())]),
            ),
            Column::new("d", ColumnValue::Date(vec![ymd(2021, 1, 1), ymd(2021, 2, 28)])),
        ])
        .unwrap()
    }

    fn add(left: Expr, right: Expr) -> Expr {
        Expr::Add {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn col(name: &str) -> Expr {
        Expr::Column(name.to_string())
    }

    fn coerced(rule: CoercionRule, left: &str, right: &str) -> Expr {
        Expr::Coerced(CoercedAdd {
            rule,
            left: left.to_string(),
            right: right.to_string(),
        })
    }

    #[test]
    fn test_literal_broadcasts() {
        let t = table();
        assert_eq!(
            evaluate(&Expr::Integer(7), &t).unwrap(),
            ColumnValue::Integer(vec![Some(7), Some(7)])
        );
    }

    #[test]
    fn test_integer_addition_propagates_missing() {
        let t = table();
        assert_eq!(
            evaluate(&add(col("p"), col("q")), &t).unwrap(),
            ColumnValue::Integer(vec![Some(12), None])
        );
    }

    #[test]
    fn test_mixed_numeric_addition_is_float() {
        let t = table();
        assert_eq!(
            evaluate(&add(col("p"), col("f")), &t).unwrap(),
            ColumnValue::Float(vec![Some(2.5), Some(4.5)])
        );
        assert_eq!(
            evaluate(&add(col("p"), Expr::Float(0.25)), &t).unwrap(),
            ColumnValue::Float(vec![Some(2.25), Some(3.25)])
        );
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        let t = table();
        let err = evaluate(&add(col("p"), Expr::Integer(i64::MAX)), &t).unwrap_err();
        assert!(matches!(err, FormulaError::Evaluation(_)));
    }

    #[test]
    fn test_plain_text_addition_is_incompatible() {
        let t = table();
        let err = evaluate(&add(col("s"), col("s")), &t).unwrap_err();
        assert_eq!(
            err,
            FormulaError::IncompatibleOperands {
                left: "Text".to_string(),
                right: "Text".to_string(),
            }
        );
    }

    #[test]
    fn test_date_plus_days() {
        let t = table();
        assert_eq!(
            evaluate(&coerced(CoercionRule::DatePlusDays, "d", "p"), &t).unwrap(),
            ColumnValue::Date(vec![ymd(2021, 1, 3), ymd(2021, 3, 3)])
        );
    }

    #[test]
    fn test_fractional_days_truncate() {
        let t = table();
        assert_eq!(
            evaluate(&coerced(CoercionRule::DatePlusDays, "d", "f"), &t).unwrap(),
            ColumnValue::Date(vec![ymd(2021, 1, 1), ymd(2021, 3, 1)])
        );
    }

    #[test]
    fn test_negative_and_missing_offsets() {
        let t = Table::from_columns(vec![
            Column::new("d", ColumnValue::Date(vec![ymd(2021, 1, 1), ymd(2021, 1, 1)])),
            Column::new("n", ColumnValue::Integer(vec![Some(-1), None])),
        ])
        .unwrap();
        assert_eq!(
            evaluate(&coerced(CoercionRule::DatePlusDays, "d", "n"), &t).unwrap(),
            ColumnValue::Date(vec![ymd(2020, 12, 31), None])
        );
    }

    #[test]
    fn test_non_finite_offset_is_parse_failure() {
        let t = Table::from_columns(vec![
            Column::new("d", ColumnValue::Date(vec![ymd(2021, 1, 1)])),
            Column::new("n", ColumnValue::Float(vec![Some(f64::INFINITY)])),
        ])
        .unwrap();
        let err = evaluate(&coerced(CoercionRule::DatePlusDays, "d", "n"), &t).unwrap_err();
        assert!(matches!(err, FormulaError::ParseFailure(_)));
    }

    #[test]
    fn test_concatenation_both_orders() {
        let t = table();
        assert_eq!(
            evaluate(&coerced(CoercionRule::TextPlusNumber, "s", "p"), &t).unwrap(),
            ColumnValue::Text(vec![Some("car-2".to_string()), Some("van-3".to_string())])
        );
        assert_eq!(
            evaluate(&coerced(CoercionRule::NumberPlusText, "f", "s"), &t).unwrap(),
            ColumnValue::Text(vec![Some("0.5car-".to_string()), Some("1.5van-".to_string())])
        );
    }

    #[test]
    fn test_unknown_column() {
        let t = table();
        assert_eq!(
            evaluate(&col("mileage"), &t).unwrap_err(),
            FormulaError::UnresolvedReference("mileage".to_string())
        );
    }
}
