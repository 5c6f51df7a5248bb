//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::core::charts::{build_chart, ChartData, ChartRequest};
use crate::core::cleaning::{self, CleaningPlan, MissingCount};
use crate::core::dates::list_date_like_columns;
use crate::core::formula::{FormulaEngine, Materialized, ResolveStrategy};
use crate::error::AutolensError;
use crate::loader::read_csv_from_reader;
use crate::types::{ColumnType, Table};

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
            error_kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.error_kind = Some(kind.into());
        self
    }
}

/// Error returned by a handler, rendered as an `ApiResponse`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: String,
    pub message: String,
}

impl ApiError {
    fn session_not_found(id: &Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "session_not_found".to_string(),
            message: format!("No session '{}'", id),
        }
    }
}

impl From<AutolensError> for ApiError {
    fn from(e: AutolensError) -> Self {
        let (status, kind) = match &e {
            AutolensError::Formula(f) => (StatusCode::UNPROCESSABLE_ENTITY, f.kind()),
            AutolensError::Csv(_) => (StatusCode::BAD_REQUEST, "invalid_csv"),
            AutolensError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AutolensError::Io(_) | AutolensError::Yaml(_) | AutolensError::Json(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        Self {
            status,
            kind: kind.to_string(),
            message: e.to_string(),
        }
    }
}

impl From<crate::error::FormulaError> for ApiError {
    fn from(e: crate::error::FormulaError) -> Self {
        AutolensError::from(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::err(self.message).with_kind(self.kind);
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Autolens API Server".to_string(),
        version: state.version.clone(),
        description: "Exploratory analysis of vehicle-listing datasets".to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("POST", "/api/v1/sessions", "Upload a CSV dataset"),
            endpoint("GET", "/api/v1/sessions/:id", "Dataset overview and preview"),
            endpoint("GET", "/api/v1/sessions/:id/missing", "Missing values per column"),
            endpoint("GET", "/api/v1/sessions/:id/date-columns", "Suggested date columns"),
            endpoint("POST", "/api/v1/sessions/:id/convert-dates", "Convert columns to dates"),
            endpoint("POST", "/api/v1/sessions/:id/clean", "Drop columns and fill missing values"),
            endpoint("POST", "/api/v1/sessions/:id/columns", "Add a column from a formula"),
            endpoint("POST", "/api/v1/sessions/:id/charts", "Compute chart data"),
            endpoint("DELETE", "/api/v1/sessions/:id", "Discard a dataset"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        sessions: state.sessions.len().await,
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: ["sessions", "dates", "clean", "formulas", "charts"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }))
}

//==============================================================================
// Sessions
//==============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    pub missing: usize,
}

/// Shape of a session's table
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
}

impl SessionSummary {
    fn new(id: Uuid, table: &Table) -> Self {
        Self {
            id,
            rows: table.row_count(),
            columns: table
                .columns()
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name.clone(),
                    column_type: c.column_type(),
                    missing: c.values.missing_count(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub summary: SessionSummary,
    /// First rows as display text, `null` for missing cells
    pub preview: Vec<Vec<Option<String>>>,
}

/// POST /api/v1/sessions - Upload a CSV body
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<(StatusCode, Json<ApiResponse<SessionSummary>>), ApiError> {
    let table = read_csv_from_reader(body.as_bytes())?;
    let id = state.sessions.insert(table.clone()).await;
    info!(session = %id, rows = table.row_count(), columns = table.width(), "session created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionSummary::new(id, &table))),
    ))
}

async fn load(state: &AppState, id: &Uuid) -> Result<Table, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::session_not_found(id))
}

/// GET /api/v1/sessions/:id - Overview and preview
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionView> {
    let table = load(&state, &id).await?;
    let head = table.head(state.config.preview_rows);
    let preview = (0..head.row_count())
        .map(|row| head.columns().iter().map(|c| c.values.display_cell(row)).collect())
        .collect();
    Ok(Json(ApiResponse::ok(SessionView {
        summary: SessionSummary::new(id, &table),
        preview,
    })))
}

/// GET /api/v1/sessions/:id/missing
pub async fn missing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<MissingCount>> {
    let table = load(&state, &id).await?;
    Ok(Json(ApiResponse::ok(cleaning::missing_summary(&table))))
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DateColumns {
    pub columns: Vec<String>,
}

/// GET /api/v1/sessions/:id/date-columns - Suggested conversions
pub async fn date_columns(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<DateColumns> {
    let table = load(&state, &id).await?;
    Ok(Json(ApiResponse::ok(DateColumns {
        columns: list_date_like_columns(&table),
    })))
}

/// POST /api/v1/sessions/:id/convert-dates
pub async fn convert_dates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<DateColumns>,
) -> ApiResult<SessionSummary> {
    let summary = state
        .sessions
        .update(&id, |table| {
            cleaning::convert_to_dates(table, &req.columns)?;
            Ok::<_, AutolensError>(SessionSummary::new(id, table))
        })
        .await
        .ok_or_else(|| ApiError::session_not_found(&id))??;
    Ok(Json(ApiResponse::ok(summary)))
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CleanRequest {
    #[serde(default)]
    pub drop: Vec<String>,
    #[serde(default)]
    pub fill: Vec<String>,
    /// Defaults to the configured fill value
    #[serde(default)]
    pub fill_value: Option<f64>,
}

/// POST /api/v1/sessions/:id/clean
pub async fn clean(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CleanRequest>,
) -> ApiResult<SessionSummary> {
    let plan = CleaningPlan {
        drop: req.drop,
        fill: req.fill,
        fill_value: req.fill_value.unwrap_or(state.config.fill_value),
    };
    let summary = state
        .sessions
        .update(&id, |table| {
            *table = plan.apply(table)?;
            Ok::<_, AutolensError>(SessionSummary::new(id, table))
        })
        .await
        .ok_or_else(|| ApiError::session_not_found(&id))??;
    Ok(Json(ApiResponse::ok(summary)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewColumnRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub resolve: Option<ResolveStrategy>,
}

/// POST /api/v1/sessions/:id/columns - Add a formula column
pub async fn add_column(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewColumnRequest>,
) -> ApiResult<Materialized> {
    let engine = FormulaEngine::new(req.resolve.unwrap_or(state.config.resolve_strategy));
    let added = state
        .sessions
        .update(&id, |table| engine.materialize(table, &req.name, &req.formula))
        .await
        .ok_or_else(|| ApiError::session_not_found(&id))??;
    Ok(Json(ApiResponse::ok(added)))
}

/// POST /api/v1/sessions/:id/charts - Chart data for a menu selection
pub async fn chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChartRequest>,
) -> ApiResult<ChartData> {
    let table = load(&state, &id).await?;
    let data = build_chart(&table, &req, &state.config)?;
    Ok(Json(ApiResponse::ok(data)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: Uuid,
    pub deleted: bool,
}

/// DELETE /api/v1/sessions/:id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeleteResponse> {
    if !state.sessions.remove(&id).await {
        return Err(ApiError::session_not_found(&id));
    }
    info!(session = %id, "session deleted");
    Ok(Json(ApiResponse::ok(DeleteResponse { id, deleted: true })))
}
