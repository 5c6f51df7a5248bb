use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AutolensError, AutolensResult};

//==============================================================================
// Column Types
//==============================================================================

/// Type tag of a column, derived from how its cells are currently stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Date,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::Text => "Text",
            ColumnType::Date => "Date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column cells (homogeneous, `None` marks a missing cell)
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

impl ColumnValue {
    /// Get the length of the array
    pub fn len(&self) -> usize {
        match self {
            ColumnValue::Integer(v) => v.len(),
            ColumnValue::Float(v) => v.len(),
            ColumnValue::Text(v) => v.len(),
            ColumnValue::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnValue::Integer(_) => ColumnType::Integer,
            ColumnValue::Float(_) => ColumnType::Float,
            ColumnValue::Text(_) => ColumnType::Text,
            ColumnValue::Date(_) => ColumnType::Date,
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnValue::Integer(v) => v[row].is_none(),
            ColumnValue::Float(v) => v[row].is_none(),
            ColumnValue::Text(v) => v[row].is_none(),
            ColumnValue::Date(v) => v[row].is_none(),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Numeric view of the column (integers widened to f64), `None` for
    /// non-numeric columns
    pub fn to_f64(&self) -> Option<Vec<Option<f64>>> {
        match self {
            ColumnValue::Integer(v) => Some(v.iter().map(|c| c.map(|n| n as f64)).collect()),
            ColumnValue::Float(v) => Some(v.clone()),
            ColumnValue::Text(_) | ColumnValue::Date(_) => None,
        }
    }

    /// Render one cell as text, `None` when missing
    pub fn display_cell(&self, row: usize) -> Option<String> {
        match self {
            ColumnValue::Integer(v) => v[row].map(|n| n.to_string()),
            ColumnValue::Float(v) => v[row].map(format_float),
            ColumnValue::Text(v) => v[row].clone(),
            ColumnValue::Date(v) => v[row].map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Copy of the rows in `start..end`
    pub fn slice(&self, start: usize, end: usize) -> ColumnValue {
        match self {
            ColumnValue::Integer(v) => ColumnValue::Integer(v[start..end].to_vec()),
            ColumnValue::Float(v) => ColumnValue::Float(v[start..end].to_vec()),
            ColumnValue::Text(v) => ColumnValue::Text(v[start..end].to_vec()),
            ColumnValue::Date(v) => ColumnValue::Date(v[start..end].to_vec()),
        }
    }
}

/// Format a float the way the dataset tools print them: integral values keep
/// a trailing `.0` so they stay distinguishable from integers.
pub fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

//==============================================================================
// Table
//==============================================================================

/// A named column of a table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValue,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValue) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column_type(&self) -> ColumnType {
        self.values.column_type()
    }
}

/// Ordered, equal-length, uniquely named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, checking lengths and name uniqueness
    pub fn from_columns(columns: Vec<Column>) -> AutolensResult<Self> {
        let mut table = Table::new();
        for column in columns {
            if table.column(&column.name).is_some() {
                return Err(AutolensError::Validation(format!(
                    "Duplicate column name '{}'",
                    column.name
                )));
            }
            table.add_column(column)?;
        }
        Ok(table)
    }

    /// Append a column, or replace the same-named column in place
    pub fn add_column(&mut self, column: Column) -> AutolensResult<()> {
        let existing = self.position(&column.name);
        let other_columns = self.columns.len() - usize::from(existing.is_some());
        if other_columns > 0 && column.len() != self.row_count() {
            return Err(AutolensError::Validation(format!(
                "Column '{}' has {} rows, expected {} rows",
                column.name,
                column.len(),
                self.row_count()
            )));
        }

        match existing {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        self.position(name).map(|idx| self.columns.remove(idx))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get the number of rows (length of first column, all are the same)
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |col| col.len())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Table {
        let end = n.min(self.row_count());
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values.slice(0, end)))
                .collect(),
        }
    }
}
