//! Dashboard core: formulas, date detection, cleaning and chart data

pub mod charts;
pub mod cleaning;
pub mod dates;
pub mod formula;

pub use charts::{build_chart, ChartData, ChartKind, ChartRequest};
pub use cleaning::{missing_summary, CleaningPlan, MissingCount};
pub use dates::{coerce_to_date_or_none, is_date_like, list_date_like_columns};
pub use formula::{materialize_column, FormulaEngine, Materialized, ResolveStrategy};
