//! Missing-value handling and datetime conversion
//!
//! Every operation validates its whole selection before touching the table,
//! so a rejected request leaves the table as it was.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::dates::coerce_to_date_or_none;
use crate::error::{AutolensError, AutolensResult};
use crate::types::{Column, ColumnType, ColumnValue, Table};

/// Missing cells of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCount {
    pub name: String,
    pub missing: usize,
}

/// Missing-cell counts for every column, in table order
pub fn missing_summary(table: &Table) -> Vec<MissingCount> {
    table
        .columns()
        .iter()
        .map(|c| MissingCount {
            name: c.name.clone(),
            missing: c.values.missing_count(),
        })
        .collect()
}

/// Names of the columns with at least one missing cell
pub fn columns_with_missing(table: &Table) -> Vec<String> {
    missing_summary(table)
        .into_iter()
        .filter(|m| m.missing > 0)
        .map(|m| m.name)
        .collect()
}

fn require_columns<'a>(table: &'a Table, names: &[String]) -> AutolensResult<Vec<&'a Column>> {
    names
        .iter()
        .map(|name| {
            table
                .column(name)
                .ok_or_else(|| AutolensError::Validation(format!("Unknown column '{}'", name)))
        })
        .collect()
}

pub fn drop_columns(table: &mut Table, names: &[String]) -> AutolensResult<()> {
    require_columns(table, names)?;
    for name in names {
        table.remove_column(name);
    }
    info!(dropped = ?names, "dropped columns");
    Ok(())
}

fn fill_column(column: &Column, value: f64) -> AutolensResult<ColumnValue> {
    let integral = value.fract() == 0.0 && value.abs() < i64::MAX as f64;
    let filled = match &column.values {
        ColumnValue::Integer(v) if integral => {
            ColumnValue::Integer(v.iter().map(|c| Some(c.unwrap_or(value as i64))).collect())
        }
        ColumnValue::Integer(v) => ColumnValue::Float(
            v.iter()
                .map(|c| Some(c.map_or(value, |n| n as f64)))
                .collect(),
        ),
        ColumnValue::Float(v) => ColumnValue::Float(v.iter().map(|c| Some(c.unwrap_or(value))).collect()),
        ColumnValue::Text(v) => {
            let text = if integral {
                format!("{}", value as i64)
            } else {
                value.to_string()
            };
            ColumnValue::Text(v.iter().map(|c| Some(c.clone().unwrap_or_else(|| text.clone()))).collect())
        }
        ColumnValue::Date(_) => {
            return Err(AutolensError::Validation(format!(
                "Cannot fill date column '{}' with a number",
                column.name
            )))
        }
    };
    Ok(filled)
}

/// Replace missing cells of the named columns with `value`
pub fn fill_missing(table: &mut Table, names: &[String], value: f64) -> AutolensResult<()> {
    let filled: Vec<Column> = require_columns(table, names)?
        .into_iter()
        .map(|c| fill_column(c, value).map(|v| Column::new(c.name.clone(), v)))
        .collect::<AutolensResult<_>>()?;

    for column in filled {
        table.add_column(column)?;
    }
    info!(filled = ?names, value, "filled missing values");
    Ok(())
}

/// Convert the named text columns to date columns
pub fn convert_to_dates(table: &mut Table, names: &[String]) -> AutolensResult<()> {
    let mut converted = Vec::with_capacity(names.len());
    for column in require_columns(table, names)? {
        if column.column_type() != ColumnType::Text {
            return Err(AutolensError::Validation(format!(
                "Column '{}' is {}, only text columns can be converted to dates",
                column.name,
                column.column_type()
            )));
        }
        let dates = coerce_to_date_or_none(&column.values).ok_or_else(|| {
            AutolensError::Validation(format!("Column '{}' is not date-like", column.name))
        })?;
        converted.push(Column::new(column.name.clone(), ColumnValue::Date(dates)));
    }

    for column in converted {
        table.add_column(column)?;
    }
    info!(converted = ?names, "converted columns to dates");
    Ok(())
}

/// Columns to drop and to fill, as chosen in the cleaning sidebar
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningPlan {
    #[serde(default)]
    pub drop: Vec<String>,
    #[serde(default)]
    pub fill: Vec<String>,
    #[serde(default)]
    pub fill_value: f64,
}

impl CleaningPlan {
    pub fn is_empty(&self) -> bool {
        self.drop.is_empty() && self.fill.is_empty()
    }

    /// Cleaned copy of `table`: drops first, then fills
    pub fn apply(&self, table: &Table) -> AutolensResult<Table> {
        let mut cleaned = table.clone();
        if !self.drop.is_empty() {
            drop_columns(&mut cleaned, &self.drop)?;
        }
        if !self.fill.is_empty() {
            fill_missing(&mut cleaned, &self.fill, self.fill_value)?;
        }
        Ok(cleaned)
    }
}
