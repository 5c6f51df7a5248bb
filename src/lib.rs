//! Autolens - exploratory analysis of vehicle-listing CSVs
//!
//! This library loads a listings table, suggests which text columns hold
//! dates, cleans missing values, prepares chart data and adds columns from
//! ad-hoc formulas such as `date_posted + days_listed`.
//!
//! # Features
//!
//! - Type inference for CSV columns (integer, float, text)
//! - Date-likeness detection and conversion
//! - Formula columns with type-directed `+` (date offset, concatenation, sum)
//! - Histogram, scatter, heatmap, bar, box and distribution chart data
//! - A colored CLI and an HTTP API over in-memory sessions
//!
//! # Example
//!
//! ```no_run
//! use autolens::core::materialize_column;
//! use autolens::loader::read_csv;
//! use std::path::Path;
//!
//! let mut table = read_csv(Path::new("vehicles_us.csv"))?;
//! let added = materialize_column(&mut table, "date_removed", "date_posted + days_listed")?;
//!
//! println!("{} is a {} column", added.name, added.column_type);
//! # Ok::<(), autolens::error::AutolensError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod loader;
pub mod types;

// Re-export commonly used types
pub use error::{AutolensError, AutolensResult, FormulaError};
pub use types::{Column, ColumnType, ColumnValue, Table};
