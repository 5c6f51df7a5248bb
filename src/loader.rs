//! CSV loading and saving
//!
//! Column types are inferred per column from the non-missing cells: all
//! integers give an integer column, all numbers a float column, anything
//! else stays text. Dates are left as text; the date suggestion step decides
//! which text columns to convert.

use csv::{ReaderBuilder, WriterBuilder};
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::error::AutolensResult;
use crate::types::{Column, ColumnValue, Table};

/// Cell contents treated as missing, compared case-insensitively
const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none"];

pub fn is_missing_marker(cell: &str) -> bool {
    let trimmed = cell.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Load a CSV file with a header row
pub fn read_csv(path: &Path) -> AutolensResult<Table> {
    let file = std::fs::File::open(path)?;
    let table = read_csv_from_reader(file)?;
    info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.width(),
        "loaded csv"
    );
    Ok(table)
}

pub fn read_csv_from_reader<R: Read>(reader: R) -> AutolensResult<Table> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = unique_headers(reader.headers()?.iter());
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (idx, field) in record.iter().enumerate() {
            cells[idx].push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| {
            let values = infer_column(raw);
            debug!(column = %name, column_type = %values.column_type(), "inferred column type");
            Column::new(name, values)
        })
        .collect();
    Table::from_columns(columns)
}

/// Blank headers become `Unnamed: i`, repeats get a `.n` suffix
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();
    for (idx, header) in raw.enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        let mut n = 1;
        while !seen.insert(name.clone()) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        headers.push(name);
    }
    headers
}

/// Pick the narrowest type that holds every non-missing cell
fn infer_column(raw: Vec<String>) -> ColumnValue {
    let present = || raw.iter().filter(|c| !is_missing_marker(c));

    if present().all(|c| c.trim().parse::<i64>().is_ok()) {
        return ColumnValue::Integer(
            raw.iter()
                .map(|c| c.trim().parse::<i64>().ok().filter(|_| !is_missing_marker(c)))
                .collect(),
        );
    }
    if present().all(|c| c.trim().parse::<f64>().is_ok()) {
        return ColumnValue::Float(
            raw.iter()
                .map(|c| c.trim().parse::<f64>().ok().filter(|v| !v.is_nan()))
                .collect(),
        );
    }
    ColumnValue::Text(
        raw.into_iter()
            .map(|c| if is_missing_marker(&c) { None } else { Some(c) })
            .collect(),
    )
}

/// Save a table as CSV; missing cells are written empty
pub fn write_csv(table: &Table, path: &Path) -> AutolensResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to_writer(table, file)?;
    info!(path = %path.display(), rows = table.row_count(), "wrote csv");
    Ok(())
}

pub fn write_csv_to_writer<W: Write>(table: &Table, writer: W) -> AutolensResult<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(table.column_names())?;
    for row in 0..table.row_count() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.values.display_cell(row).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;
    use pretty_assertions::assert_eq;

    fn load(text: &str) -> Table {
        read_csv_from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_type_inference() {
        let table = load("price,odometer,model,date_posted\n9400,145000.5,bmw x5,2018-06-23\n25500,,ford f-150,2018-10-19\n");
        let types: Vec<ColumnType> = table.columns().iter().map(|c| c.column_type()).collect();
        assert_eq!(
            types,
            vec![ColumnType::Integer, ColumnType::Float, ColumnType::Text, ColumnType::Text]
        );
        assert_eq!(
            table.column("odometer").unwrap().values,
            ColumnValue::Float(vec![Some(145000.5), None])
        );
    }

    #[test]
    fn test_missing_markers() {
        let table = load("a,b\nNA,x\n1,null\nnan,NaN\n");
        assert_eq!(
            table.column("a").unwrap().values,
            ColumnValue::Integer(vec![None, Some(1), None])
        );
        assert_eq!(
            table.column("b").unwrap().values,
            ColumnValue::Text(vec![Some("x".to_string()), None, None])
        );
    }

    #[test]
    fn test_all_missing_column_is_integer() {
        let table = load("a,b\n,1\n,2\n");
        assert_eq!(table.column("a").unwrap().values.missing_count(), 2);
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let table = load("a,a,,a\n1,2,3,4\n");
        assert_eq!(table.column_names(), vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        assert!(read_csv_from_reader("a,b\n1,2\n3\n".as_bytes()).is_err());
    }

    #[test]
    fn test_write_csv() {
        let table = load("price,model\n1,x\n,y\n");
        let mut out = Vec::new();
        write_csv_to_writer(&table, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "price,model\n1,x\n,y\n");
    }
}
