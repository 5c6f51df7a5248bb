//! Autolens API Server binary
//!
//! HTTP REST API for exploring vehicle-listing datasets.

use clap::Parser;
use std::path::PathBuf;

use autolens::api::{run_api_server, server::ApiConfig};
use autolens::config::DashboardConfig;

#[derive(Parser, Debug)]
#[command(name = "autolens-server")]
#[command(version)]
#[command(about = "Autolens API Server - HTTP REST API for vehicle-listing analysis")]
#[command(long_about = r#"
Autolens API Server - HTTP REST API

Upload a CSV to open a session, then work on it:
  - POST   /api/v1/sessions                    - Upload CSV (request body)
  - GET    /api/v1/sessions/:id                - Overview and preview
  - GET    /api/v1/sessions/:id/missing        - Missing values per column
  - GET    /api/v1/sessions/:id/date-columns   - Suggested date columns
  - POST   /api/v1/sessions/:id/convert-dates  - Convert columns to dates
  - POST   /api/v1/sessions/:id/clean          - Drop / fill columns
  - POST   /api/v1/sessions/:id/columns        - Add a formula column
  - POST   /api/v1/sessions/:id/charts         - Chart data
  - DELETE /api/v1/sessions/:id                - Discard the session

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Example usage:
  autolens-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/sessions --data-binary @vehicles_us.csv
  curl -X POST http://localhost:8080/api/v1/sessions/<id>/columns \
    -H "Content-Type: application/json" \
    -d '{"name": "date_removed", "formula": "date_posted + days_listed"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "AUTOLENS_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "AUTOLENS_PORT")]
    port: u16,

    /// YAML settings file
    #[arg(long, env = "AUTOLENS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        dashboard: DashboardConfig::load_or_default(args.config.as_deref())?,
    };

    run_api_server(config).await
}
