//! CLI command handlers

pub mod commands;

pub use commands::{add_column, chart, clean, dates, inspect};
