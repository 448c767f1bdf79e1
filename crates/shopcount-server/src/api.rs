//! HTTP routes for ingest and reporting
//!
//! Report endpoints answer with the report document as JSON, or with a CSV
//! download when `format=csv` is requested.

use crate::error::{ApiError, ApiResult};
use crate::persistence::SqliteCountStore;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shopcount_common::{BranchId, BranchInfo, CountRecord, ReportFormat, ShopCountError};
use shopcount_reports::request::{ComparisonQuery, DateQuery, MonthQuery, RangeQuery};
use shopcount_config::ConfigCache;
use shopcount_reports::{render, CurrentOccupancy, ReportService, TabularReport};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Report service over the SQLite store
    pub service: Arc<ReportService<SqliteCountStore>>,
    /// Live configuration; reloading it changes report settings for new requests
    pub config: Arc<ConfigCache>,
}

impl AppState {
    /// Builds the state from a store and the shared configuration cache.
    pub fn new(store: SqliteCountStore, config: Arc<ConfigCache>) -> Self {
        Self {
            service: Arc::new(ReportService::new(store, Arc::clone(&config))),
            config,
        }
    }

    fn store(&self) -> &SqliteCountStore {
        self.service.store()
    }
}

/// One count record as sent by a camera.
#[derive(Debug, Clone, Deserialize)]
pub struct CountPayload {
    /// Reporting camera
    pub camera_id: String,
    /// Branch the camera belongs to
    pub branch_id: String,
    /// RFC 3339 timestamp, or a naive branch-local `YYYY-MM-DD[T ]HH:MM:SS`
    pub timestamp: String,
    /// People that entered
    pub entry_count: u32,
    /// People that left
    pub exit_count: u32,
    /// Occupancy at `timestamp`
    pub current_count: u32,
}

/// Body of `POST /api/v1/counts/batch`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    /// Records to store
    pub data: Vec<CountPayload>,
}

/// Body of `PUT /api/v1/branches/:branch_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchRequest {
    /// Display name
    pub name: String,
}

/// Response of the ingest endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Always `true`
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Number of stored records
    pub count: u64,
}

/// Successful JSON envelope for non-report endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    /// Always `true`
    pub success: bool,
    /// Payload
    pub data: T,
}

impl<T> DataResponse<T> {
    const fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` when the database answers
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/branches/:branch_id", put(upsert_branch))
        // Ingest and raw counts
        .route("/api/v1/counts/batch", post(record_batch))
        .route("/api/v1/counts/current/:branch_id", get(current_counts))
        .route("/api/v1/counts/history/:branch_id", get(count_history))
        .route("/api/v1/counts/summary/:branch_id", get(count_summary))
        // Reports
        .route("/api/v1/reports/daily/:branch_id", get(daily_report))
        .route("/api/v1/reports/weekly/:branch_id", get(weekly_report))
        .route("/api/v1/reports/monthly/:branch_id", get(monthly_report))
        .route("/api/v1/reports/comparison/:branch_id", get(comparison_report))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.store().ping().await?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn upsert_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    payload: Result<Json<BranchRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<BranchInfo>>> {
    let Json(request) = payload?;
    if request.name.trim().is_empty() {
        return Err(ShopCountError::validation_field("branch name cannot be empty", "name").into());
    }

    let branch = BranchInfo::new(branch_id, request.name.trim());
    state.store().upsert_branch(&branch).await?;
    Ok(Json(DataResponse::new(branch)))
}

async fn record_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<IngestResponse>> {
    let Json(batch) = payload?;
    if batch.data.is_empty() {
        return Ok(Json(IngestResponse {
            success: true,
            message: "No records to store".to_string(),
            count: 0,
        }));
    }

    let tz = state.service.settings()?.timezone;
    let records = batch
        .data
        .into_iter()
        .map(|item| to_record(item, tz))
        .collect::<shopcount_common::Result<Vec<_>>>()?;

    let count = state.store().insert_records(&records).await?;
    info!(count, "Ingested count batch");

    Ok(Json(IngestResponse {
        success: true,
        message: "Records stored".to_string(),
        count,
    }))
}

async fn current_counts(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> ApiResult<Json<DataResponse<CurrentOccupancy>>> {
    let occupancy = state.service.current(&BranchId::from(branch_id)).await?;
    Ok(Json(DataResponse::new(occupancy)))
}

async fn count_history(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Response> {
    let service = &state.service;
    let range = query.resolve_range(service.today()?)?;
    let interval = query.resolve_interval()?;
    let format = query.resolve_format(service.settings()?.default_format)?;

    let report = service
        .history(&BranchId::from(branch_id), range, interval)
        .await?;
    report_response(&report, format)
}

async fn count_summary(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Response> {
    let service = &state.service;
    let range = query.resolve_range(service.today()?)?;
    let format = query.resolve_format(service.settings()?.default_format)?;

    let report = service.summary(&BranchId::from(branch_id), range).await?;
    report_response(&report, format)
}

async fn daily_report(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Response> {
    let service = &state.service;
    let date = query.resolve_date(service.today()?)?;
    let format = query.resolve_format(service.settings()?.default_format)?;

    let report = service.daily(&BranchId::from(branch_id), date).await?;
    report_response(&report, format)
}

async fn weekly_report(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Response> {
    let service = &state.service;
    let date = query.resolve_date(service.today()?)?;
    let format = query.resolve_format(service.settings()?.default_format)?;

    let report = service.weekly(&BranchId::from(branch_id), date).await?;
    report_response(&report, format)
}

async fn monthly_report(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Response> {
    let service = &state.service;
    let (year, month) = query.resolve_month(service.today()?)?;
    let format = query.resolve_format(service.settings()?.default_format)?;

    let report = service
        .monthly(&BranchId::from(branch_id), year, month)
        .await?;
    report_response(&report, format)
}

async fn comparison_report(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    Query(query): Query<ComparisonQuery>,
) -> ApiResult<Response> {
    let service = &state.service;
    let (period1, period2) = query.resolve_periods(service.today()?)?;
    let format = query.resolve_format(service.settings()?.default_format)?;

    let report = service
        .comparison(&BranchId::from(branch_id), period1, period2)
        .await?;
    report_response(&report, format)
}

/// Renders `report` and attaches content headers; CSV becomes a download.
fn report_response<R: TabularReport>(report: &R, format: ReportFormat) -> ApiResult<Response> {
    let rendered = render(report, format)?;

    let mut response = rendered.body.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(rendered.content_type),
    );
    if format == ReportFormat::Csv {
        let disposition = HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            rendered.filename
        ))
        .map_err(|e| ShopCountError::report_with_source("Invalid download filename", e))?;
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok(response)
}

fn to_record(item: CountPayload, tz: Tz) -> shopcount_common::Result<CountRecord> {
    if item.branch_id.trim().is_empty() {
        return Err(ShopCountError::validation_field("branch_id cannot be empty", "branch_id"));
    }
    let timestamp = parse_timestamp(&item.timestamp, tz)?;
    Ok(CountRecord::new(
        item.branch_id,
        timestamp,
        item.entry_count,
        item.exit_count,
        item.current_count,
    )
    .with_camera(item.camera_id))
}

/// Parses an ingest timestamp into branch-local time.
///
/// Offset-aware values are converted into `tz`; naive values are taken to
/// already be local.
pub fn parse_timestamp(value: &str, tz: Tz) -> shopcount_common::Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(value) {
        return Ok(aware.with_timezone(&tz).naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| {
            ShopCountError::validation_field(
                format!("invalid timestamp '{value}', expected RFC 3339 or YYYY-MM-DD HH:MM:SS"),
                "timestamp",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopcount_common::test_utils::mock_timestamp;

    #[test]
    fn test_parse_timestamp_converts_offsets() {
        let tz = chrono_tz::Asia::Bangkok;
        assert_eq!(
            parse_timestamp("2024-01-01T02:15:00Z", tz).unwrap(),
            mock_timestamp(2024, 1, 1, 9, 15, 0)
        );
        assert_eq!(
            parse_timestamp("2024-01-01T09:15:00+07:00", tz).unwrap(),
            mock_timestamp(2024, 1, 1, 9, 15, 0)
        );
    }

    #[test]
    fn test_parse_timestamp_keeps_naive_values() {
        let tz = chrono_tz::Asia::Bangkok;
        assert_eq!(
            parse_timestamp("2024-01-01T09:15:00", tz).unwrap(),
            mock_timestamp(2024, 1, 1, 9, 15, 0)
        );
        assert_eq!(
            parse_timestamp("2024-01-01 09:15:00", tz).unwrap(),
            mock_timestamp(2024, 1, 1, 9, 15, 0)
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("yesterday", chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, ShopCountError::Validation { field: Some(ref f), .. } if f == "timestamp"));
    }

    #[test]
    fn test_to_record_requires_branch() {
        let item = CountPayload {
            camera_id: "cam-1".into(),
            branch_id: " ".into(),
            timestamp: "2024-01-01 09:00:00".into(),
            entry_count: 1,
            exit_count: 0,
            current_count: 1,
        };
        assert!(to_record(item, chrono_tz::UTC).is_err());
    }
}
