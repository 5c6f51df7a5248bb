//! Chart data preparation
//!
//! The dashboard menu offers histograms, scatter plots, a scatterplot matrix,
//! a correlation heatmap, a distribution plot, bar charts and box plots.
//! Rendering is left to the front end; these functions resolve the chart
//! parameters against the table and compute the numbers to draw.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::DashboardConfig;
use crate::error::{AutolensError, AutolensResult};
use crate::types::{ColumnType, Table};

//==============================================================================
// Column selection
//==============================================================================

/// Integer and float columns, in table order
pub fn numeric_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| c.column_type().is_numeric())
        .map(|c| c.name.clone())
        .collect()
}

/// Text columns, in table order
pub fn categorical_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| c.column_type() == ColumnType::Text)
        .map(|c| c.name.clone())
        .collect()
}

fn numeric_values(table: &Table, name: &str) -> AutolensResult<Vec<Option<f64>>> {
    let column = table
        .column(name)
        .ok_or_else(|| AutolensError::Validation(format!("Unknown column '{}'", name)))?;
    column.values.to_f64().ok_or_else(|| {
        AutolensError::Validation(format!(
            "Column '{}' is {}, a numeric column is required",
            name,
            column.column_type()
        ))
    })
}

fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().filter(|v| v.is_finite()).collect()
}

//==============================================================================
// Chart payloads
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub title: String,
    pub x: String,
    /// Column summed per bin; bins count rows when absent
    pub y: Option<String>,
    /// `bins + 1` ascending bin edges
    pub edges: Vec<f64>,
    pub heights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter {
    pub title: String,
    pub x: String,
    pub y: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterMatrix {
    pub title: String,
    pub dimensions: Vec<String>,
    /// One value vector per dimension, aligned by row
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub title: String,
    pub columns: Vec<String>,
    /// Pearson coefficients; `None` where a pair has no variance
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub label: Option<String>,
    pub stats: BoxStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlot {
    pub title: String,
    pub y: String,
    pub by: Option<String>,
    pub groups: Vec<BoxGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x: String,
    pub y: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub title: String,
    pub histogram: Histogram,
    /// Summary drawn in the margin above the histogram
    pub marginal: Option<BoxStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Histogram(Histogram),
    Scatter(Scatter),
    ScatterMatrix(ScatterMatrix),
    Heatmap(CorrelationMatrix),
    Distribution(Distribution),
    Bar(BarChart),
    Box(BoxPlot),
}

//==============================================================================
// Computations
//==============================================================================

/// Largest histogram bin count accepted
pub const MAX_BINS: usize = 10_000;

/// Reject bin counts outside `1..=MAX_BINS`
pub fn check_bins(bins: usize) -> AutolensResult<usize> {
    if bins == 0 || bins > MAX_BINS {
        return Err(AutolensError::Validation(format!(
            "Bin count must be between 1 and {}, got {}",
            MAX_BINS, bins
        )));
    }
    Ok(bins)
}

fn bin_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    if min == max {
        return vec![min - 0.5, max + 0.5];
    }
    let width = (max - min) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| min + width * i as f64).collect();
    edges.push(max);
    edges
}

fn binned(x: &[Option<f64>], weights: Option<&[Option<f64>]>, bins: usize) -> (Vec<f64>, Vec<f64>) {
    let values = present(x);
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return (Vec::new(), Vec::new());
    };

    let edges = bin_edges(min, max, bins);
    let bin_count = edges.len() - 1;
    let width = edges[1] - edges[0];
    let mut heights = vec![0.0; bin_count];

    for (row, value) in x.iter().enumerate() {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        let weight = match weights {
            Some(w) => match w[row] {
                Some(w) => w,
                None => continue,
            },
            None => 1.0,
        };
        let idx = (((v - edges[0]) / width).floor() as usize).min(bin_count - 1);
        heights[idx] += weight;
    }

    (edges, heights)
}

/// Equal-width histogram of a numeric column
pub fn histogram(table: &Table, x: &str, bins: usize) -> AutolensResult<Histogram> {
    let bins = check_bins(bins)?;
    let values = numeric_values(table, x)?;
    let (edges, heights) = binned(&values, None, bins);
    Ok(Histogram {
        title: format!("Histogram of {}", x),
        x: x.to_string(),
        y: None,
        edges,
        heights,
    })
}

pub fn scatter(table: &Table, x: &str, y: &str) -> AutolensResult<Scatter> {
    let xs = numeric_values(table, x)?;
    let ys = numeric_values(table, y)?;
    let points = xs
        .iter()
        .zip(&ys)
        .filter_map(|(a, b)| Some([(*a)?, (*b)?]))
        .collect();
    Ok(Scatter {
        title: format!("Scatter Plot: {} vs {}", x, y),
        x: x.to_string(),
        y: y.to_string(),
        points,
    })
}

/// The first `max_dims` numeric columns
pub fn scatter_matrix(table: &Table, max_dims: usize) -> AutolensResult<ScatterMatrix> {
    let dimensions: Vec<String> = numeric_columns(table).into_iter().take(max_dims).collect();
    let values = dimensions
        .iter()
        .map(|name| numeric_values(table, name))
        .collect::<AutolensResult<_>>()?;
    Ok(ScatterMatrix {
        title: "Scatterplot Matrix".to_string(),
        dimensions,
        values,
    })
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Pairwise Pearson correlation of all numeric columns
pub fn correlation_matrix(table: &Table) -> AutolensResult<CorrelationMatrix> {
    let columns = numeric_columns(table);
    if columns.len() < 2 {
        return Err(AutolensError::Validation(
            "A heatmap needs at least two numeric columns".to_string(),
        ));
    }
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| numeric_values(table, name))
        .collect::<AutolensResult<_>>()?;

    let values = data
        .iter()
        .map(|a| data.iter().map(|b| pearson(a, b)).collect())
        .collect();
    Ok(CorrelationMatrix {
        title: "Correlation Heatmap".to_string(),
        columns,
        values,
    })
}

/// Linear-interpolation quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Five-number summary of `y`, optionally per value of a text column
pub fn box_plot(table: &Table, y: &str, by: Option<&str>) -> AutolensResult<BoxPlot> {
    let ys = numeric_values(table, y)?;

    let groups = match by {
        None => BoxStats::from_values(&present(&ys))
            .map(|stats| vec![BoxGroup { label: None, stats }])
            .unwrap_or_default(),
        Some(by_name) => {
            let by_column = table
                .column(by_name)
                .ok_or_else(|| AutolensError::Validation(format!("Unknown column '{}'", by_name)))?;
            let mut order: Vec<String> = Vec::new();
            let mut buckets: HashMap<String, Vec<f64>> = HashMap::new();
            for (row, value) in ys.iter().enumerate() {
                let (Some(label), Some(value)) = (by_column.values.display_cell(row), value) else {
                    continue;
                };
                if !buckets.contains_key(&label) {
                    order.push(label.clone());
                }
                buckets.entry(label).or_default().push(*value);
            }
            order
                .into_iter()
                .filter_map(|label| {
                    let stats = BoxStats::from_values(&buckets[&label])?;
                    Some(BoxGroup {
                        label: Some(label),
                        stats,
                    })
                })
                .collect()
        }
    };

    let title = match by {
        Some(by) => format!("Box Plot of {} by {}", y, by),
        None => format!("Box Plot of {}", y),
    };
    Ok(BoxPlot {
        title,
        y: y.to_string(),
        by: by.map(str::to_string),
        groups,
    })
}

/// Sum of `y` for each distinct value of `x`, in first-seen order
pub fn bar_chart(table: &Table, x: &str, y: &str) -> AutolensResult<BarChart> {
    let x_column = table
        .column(x)
        .ok_or_else(|| AutolensError::Validation(format!("Unknown column '{}'", x)))?;
    let ys = numeric_values(table, y)?;

    let mut bars: Vec<Bar> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (row, value) in ys.iter().enumerate() {
        let (Some(label), Some(value)) = (x_column.values.display_cell(row), value) else {
            continue;
        };
        match index.get(&label) {
            Some(&i) => bars[i].value += value,
            None => {
                index.insert(label.clone(), bars.len());
                bars.push(Bar {
                    label,
                    value: *value,
                });
            }
        }
    }

    Ok(BarChart {
        title: format!("Bar Chart: {} vs {}", x, y),
        x: x.to_string(),
        y: y.to_string(),
        bars,
    })
}

/// Histogram of `x` (summing `y` per bin when given) with a marginal summary
pub fn distribution(
    table: &Table,
    x: &str,
    y: Option<&str>,
    bins: usize,
) -> AutolensResult<Distribution> {
    let bins = check_bins(bins)?;
    let xs = numeric_values(table, x)?;
    let ys = y.map(|name| numeric_values(table, name)).transpose()?;
    let (edges, heights) = binned(&xs, ys.as_deref(), bins);

    Ok(Distribution {
        title: format!("Distribution of {}", x),
        histogram: Histogram {
            title: format!("Histogram of {}", x),
            x: x.to_string(),
            y: y.map(str::to_string),
            edges,
            heights,
        },
        marginal: BoxStats::from_values(&present(&xs)),
    })
}

//==============================================================================
// Menu
//==============================================================================

/// Charts offered by the visualization menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    Scatter,
    ScatterMatrix,
    Heatmap,
    Distribution,
    Bar,
    Box,
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "histogram" => Ok(ChartKind::Histogram),
            "scatter" | "scatter_plot" => Ok(ChartKind::Scatter),
            "scatter_matrix" | "scatterplot_matrix" => Ok(ChartKind::ScatterMatrix),
            "heatmap" => Ok(ChartKind::Heatmap),
            "distribution" | "distplot" => Ok(ChartKind::Distribution),
            "bar" | "bar_chart" => Ok(ChartKind::Bar),
            "box" | "boxplot" | "box_plot" => Ok(ChartKind::Box),
            other => Err(format!("unknown chart '{}'", other)),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Histogram => "histogram",
            ChartKind::Scatter => "scatter",
            ChartKind::ScatterMatrix => "scatter_matrix",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Distribution => "distribution",
            ChartKind::Bar => "bar",
            ChartKind::Box => "box",
        };
        f.write_str(name)
    }
}

/// A menu selection with its axis choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub bins: Option<usize>,
}

impl ChartRequest {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            x: None,
            y: None,
            by: None,
            bins: None,
        }
    }
}

fn required<'a>(value: &'a Option<String>, axis: &str, kind: ChartKind) -> AutolensResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| AutolensError::Validation(format!("The {} chart needs a {} column", kind, axis)))
}

/// Compute the data for a menu selection
pub fn build_chart(
    table: &Table,
    request: &ChartRequest,
    config: &DashboardConfig,
) -> AutolensResult<ChartData> {
    let bins = request.bins.unwrap_or(config.histogram_bins);
    let kind = request.kind;
    let chart = match kind {
        ChartKind::Histogram => ChartData::Histogram(histogram(table, required(&request.x, "x", kind)?, bins)?),
        ChartKind::Scatter => ChartData::Scatter(scatter(
            table,
            required(&request.x, "x", kind)?,
            required(&request.y, "y", kind)?,
        )?),
        ChartKind::ScatterMatrix => ChartData::ScatterMatrix(scatter_matrix(table, config.scatter_matrix_dims)?),
        ChartKind::Heatmap => ChartData::Heatmap(correlation_matrix(table)?),
        ChartKind::Distribution => ChartData::Distribution(distribution(
            table,
            required(&request.x, "x", kind)?,
            request.y.as_deref(),
            bins,
        )?),
        ChartKind::Bar => ChartData::Bar(bar_chart(
            table,
            required(&request.x, "x", kind)?,
            required(&request.y, "y", kind)?,
        )?),
        ChartKind::Box => ChartData::Box(box_plot(
            table,
            required(&request.y, "y", kind)?,
            request.by.as_deref(),
        )?),
    };
    Ok(chart)
}
