use crate::config::DashboardConfig;
use crate::core::charts::{build_chart, ChartKind, ChartRequest};
use crate::core::cleaning::{self, CleaningPlan};
use crate::core::dates::list_date_like_columns;
use crate::core::formula::{FormulaEngine, ResolveStrategy};
use crate::error::{AutolensError, AutolensResult};
use crate::loader::{read_csv, write_csv};
use crate::types::Table;
use colored::Colorize;
use std::path::PathBuf;

/// Widest preview cell before truncation
const MAX_CELL_WIDTH: usize = 24;

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    format!("{:.2}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn truncate(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell.to_string();
    }
    let mut short: String = cell.chars().take(MAX_CELL_WIDTH - 1).collect();
    short.push('…');
    short
}

/// Render the first rows of a table as aligned text
fn render_preview(table: &Table) -> Vec<String> {
    let header: Vec<String> = table.column_names().iter().map(|n| truncate(n)).collect();
    let rows: Vec<Vec<String>> = (0..table.row_count())
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|c| truncate(&c.values.display_cell(row).unwrap_or_else(|| "NaN".to_string())))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    std::iter::once(line(&header))
        .chain(rows.iter().map(|r| line(r)))
        .collect()
}

fn print_preview(table: &Table, rows: usize) {
    for line in render_preview(&table.head(rows)) {
        println!("   {}", line);
    }
}

fn print_missing(table: &Table) {
    let rows = table.row_count();
    for entry in cleaning::missing_summary(table) {
        let share = if rows == 0 {
            0.0
        } else {
            entry.missing as f64 * 100.0 / rows as f64
        };
        let line = format!("{:<24} {:>8}  ({}%)", entry.name, entry.missing, format_number(share));
        if entry.missing > 0 {
            println!("   {}", line.yellow());
        } else {
            println!("   {}", line);
        }
    }
}

fn save_or_hint(table: &Table, output: Option<PathBuf>) -> AutolensResult<()> {
    match output {
        Some(path) => {
            write_csv(table, &path)?;
            println!("{}", format!("💾 Saved to {}", path.display()).bold().green());
        }
        None => println!("{}", "📋 Not saved (use --output to write a CSV)".yellow()),
    }
    Ok(())
}

/// Execute the inspect command
pub fn inspect(file: PathBuf, config: &DashboardConfig) -> AutolensResult<()> {
    println!("{}", "🔎 Autolens - Dataset overview".bold().green());
    println!("   File: {}\n", file.display());

    let table = read_csv(&file)?;
    println!("   {} rows, {} columns\n", table.row_count(), table.width());

    println!("{}", "📋 Preview:".bold().cyan());
    print_preview(&table, config.preview_rows);
    println!();

    println!("{}", "🔤 Column types:".bold().cyan());
    for column in table.columns() {
        println!("   {:<24} {}", column.name, column.column_type().to_string().bright_blue());
    }
    println!();

    println!("{}", "🕳️  Missing values:".bold().cyan());
    print_missing(&table);
    Ok(())
}

/// Execute the dates command
pub fn dates(file: PathBuf, convert: bool, output: Option<PathBuf>) -> AutolensResult<()> {
    println!("{}", "📅 Autolens - Date-like columns".bold().green());
    println!("   File: {}\n", file.display());

    let mut table = read_csv(&file)?;
    let candidates = list_date_like_columns(&table);
    if candidates.is_empty() {
        println!("{}", "   No date-like columns found".yellow());
        return Ok(());
    }
    for name in &candidates {
        println!("   {}", name.bright_blue().bold());
    }
    println!();

    if convert {
        cleaning::convert_to_dates(&mut table, &candidates)?;
        println!(
            "{}",
            format!("✅ Converted {} column(s) to dates", candidates.len()).bold().green()
        );
        save_or_hint(&table, output)?;
    }
    Ok(())
}

/// Execute the add-column command
pub fn add_column(
    file: PathBuf,
    name: String,
    formula: String,
    output: Option<PathBuf>,
    strategy: ResolveStrategy,
    config: &DashboardConfig,
) -> AutolensResult<()> {
    println!("{}", "🧮 Autolens - New column".bold().green());
    println!("   File: {}", file.display());
    println!("   Formula: {}\n", formula.bright_yellow());

    let mut table = read_csv(&file)?;
    let engine = FormulaEngine::new(strategy);
    let added = match engine.materialize(&mut table, &name, &formula) {
        Ok(added) => added,
        Err(e) => {
            println!("{}", format!("❌ {}", e).bold().red());
            return Err(e.into());
        }
    };

    println!(
        "{}",
        format!("✅ Added '{}' ({}, {} rows)", added.name, added.column_type, added.rows)
            .bold()
            .green()
    );
    println!("   Evaluated: {}\n", added.expression.cyan());

    let mut preview = Table::new();
    for column in table.columns() {
        if column.name == added.name {
            preview.add_column(column.clone())?;
        }
    }
    print_preview(&preview, config.preview_rows);
    println!();

    save_or_hint(&table, output)
}

/// Execute the clean command
pub fn clean(
    file: PathBuf,
    drop: Vec<String>,
    fill: Vec<String>,
    value: Option<f64>,
    output: PathBuf,
    config: &DashboardConfig,
) -> AutolensResult<()> {
    println!("{}", "🧹 Autolens - Cleaning".bold().green());
    println!("   File: {}\n", file.display());

    let plan = CleaningPlan {
        drop,
        fill,
        fill_value: value.unwrap_or(config.fill_value),
    };
    if plan.is_empty() {
        return Err(AutolensError::Validation(
            "nothing to do: pass --drop and/or --fill".to_string(),
        ));
    }

    let table = read_csv(&file)?;
    let cleaned = plan.apply(&table)?;

    if !plan.drop.is_empty() {
        println!("   Dropped: {}", plan.drop.join(", ").bright_blue());
    }
    if !plan.fill.is_empty() {
        println!(
            "   Filled:  {} with {}",
            plan.fill.join(", ").bright_blue(),
            format_number(plan.fill_value).bold()
        );
    }
    println!();

    println!("{}", "🕳️  Missing values after cleaning:".bold().cyan());
    print_missing(&cleaned);
    println!();

    save_or_hint(&cleaned, Some(output))
}

/// Execute the chart command, printing the chart data as JSON
pub fn chart(
    file: PathBuf,
    kind: ChartKind,
    x: Option<String>,
    y: Option<String>,
    by: Option<String>,
    bins: Option<usize>,
    config: &DashboardConfig,
) -> AutolensResult<()> {
    let table = read_csv(&file)?;
    let request = ChartRequest {
        kind,
        x,
        y,
        by,
        bins,
    };
    let data = build_chart(&table, &request, config)?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
