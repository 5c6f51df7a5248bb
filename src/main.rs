use autolens::cli;
use autolens::config::DashboardConfig;
use autolens::core::charts::ChartKind;
use autolens::core::formula::ResolveStrategy;
use autolens::error::AutolensResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "autolens")]
#[command(about = "Exploratory analysis of vehicle-listing CSVs")]
#[command(long_about = "Autolens - exploratory analysis of vehicle-listing CSVs

COMMANDS:
  inspect     - Preview rows, column types and missing values
  dates       - Find text columns that hold dates (and convert them)
  add-column  - Add a column computed from a formula
  clean       - Drop columns or fill missing values
  chart       - Print chart data as JSON

FORMULAS:
  Column names are typed as-is and joined with '+':
    date_posted + days_listed   -> date shifted by a number of days
    model + model_year          -> text concatenation
    price + 1000                -> numeric addition

EXAMPLES:
  autolens inspect vehicles_us.csv
  autolens add-column vehicles_us.csv --name date_removed \\
      --formula \"date_posted + days_listed\" -o out.csv
  autolens chart vehicles_us.csv box --y price --by type")]
#[command(version)]
struct Cli {
    /// YAML settings file
    #[arg(long, global = true, env = "AUTOLENS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview a CSV with column types and missing-value counts
    Inspect {
        /// Path to CSV file
        file: PathBuf,
    },

    #[command(long_about = "List text columns whose every value parses as a date.

Only suggests columns; nothing is converted unless --convert is given.
Converted columns are written as YYYY-MM-DD.")]
    /// List date-like columns
    Dates {
        /// Path to CSV file
        file: PathBuf,

        /// Convert every suggested column to dates
        #[arg(long, requires = "output")]
        convert: bool,

        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(long_about = "Add a column computed from a formula.

The only operator is '+'. Its meaning depends on the column types:
  text date + number   -> date shifted by whole days
  text + number        -> concatenation (either order)
  number + number      -> sum

An existing column with the same name is replaced in place. On error the
dataset is left untouched.")]
    /// Add a column computed from a formula
    AddColumn {
        /// Path to CSV file
        file: PathBuf,

        /// Name of the new column
        #[arg(long)]
        name: String,

        /// Formula, e.g. \"date_posted + days_listed\"
        #[arg(long)]
        formula: String,

        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How column names are matched: word-boundary or substring
        #[arg(long)]
        resolve: Option<ResolveStrategy>,
    },

    /// Drop columns and fill missing values
    Clean {
        /// Path to CSV file
        file: PathBuf,

        /// Columns to drop (comma-separated or repeated)
        #[arg(long, value_delimiter = ',')]
        drop: Vec<String>,

        /// Columns whose missing values are filled
        #[arg(long, value_delimiter = ',')]
        fill: Vec<String>,

        /// Fill value (defaults to the configured fill_value)
        #[arg(long, allow_negative_numbers = true)]
        value: Option<f64>,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    #[command(long_about = "Compute the data behind a dashboard chart and print it as JSON.

KINDS:
  histogram       --x
  scatter         --x --y
  scatter-matrix  (first numeric columns)
  heatmap         (correlation of numeric columns)
  distribution    --x [--y]
  bar             --x --y
  box             --y [--by]")]
    /// Print chart data as JSON
    Chart {
        /// Path to CSV file
        file: PathBuf,

        /// Chart kind
        kind: ChartKind,

        #[arg(long)]
        x: Option<String>,

        #[arg(long)]
        y: Option<String>,

        /// Categorical column to group by
        #[arg(long)]
        by: Option<String>,

        /// Histogram bin count
        #[arg(long)]
        bins: Option<usize>,
    },
}

fn main() -> AutolensResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autolens=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { file } => cli::inspect(file, &config),

        Commands::Dates {
            file,
            convert,
            output,
        } => cli::dates(file, convert, output),

        Commands::AddColumn {
            file,
            name,
            formula,
            output,
            resolve,
        } => cli::add_column(
            file,
            name,
            formula,
            output,
            resolve.unwrap_or(config.resolve_strategy),
            &config,
        ),

        Commands::Clean {
            file,
            drop,
            fill,
            value,
            output,
        } => cli::clean(file, drop, fill, value, output, &config),

        Commands::Chart {
            file,
            kind,
            x,
            y,
            by,
            bins,
        } => cli::chart(file, kind, x, y, by, bins, &config),
    }
}
