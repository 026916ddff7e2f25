//! Handlers for the `/alerts` resource.
//!
//! State transitions (acknowledge, resolve) are single conditional UPDATEs
//! in the repository; a zero-row match here is disambiguated into 404
//! (missing) or 409 (wrong state) with a follow-up lookup.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use gridmon_core::alert::{AlertType, Severity};
use gridmon_core::error::CoreError;
use gridmon_core::types::DbId;
use gridmon_db::models::alert::{Alert, AlertListQuery, CreateAlert, UpdateAlert};
use gridmon_db::repositories::AlertRepo;
use gridmon_events::{MonitoringEvent, EVENT_SYSTEM_MONITORING_UPDATE};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch an alert or produce the standard 404.
async fn find_alert(pool: &sqlx::PgPool, id: DbId) -> AppResult<Alert> {
    AlertRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Alert",
            id,
        }))
}

/// Disambiguate a zero-row transition: 404 when missing, 409 otherwise.
async fn transition_rejected(
    pool: &sqlx::PgPool,
    id: DbId,
    action: &str,
) -> AppError {
    match AlertRepo::find_by_id(pool, id).await {
        Ok(Some(alert)) => AppError::Core(CoreError::InvalidState(format!(
            "Cannot {action} alert {id} in its current state ({})",
            alert.status_id
        ))),
        Ok(None) => AppError::Core(CoreError::NotFound {
            entity: "Alert",
            id,
        }),
        Err(e) => AppError::Database(e),
    }
}

// ---------------------------------------------------------------------------
// Create (manual alert)
// ---------------------------------------------------------------------------

/// Request body for `POST /alerts`.
#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub building_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
    pub title: String,
    pub message: String,
    pub detected_value: Option<f64>,
    pub threshold_value: Option<f64>,
    pub metadata: Option<serde_json::Value>,
}

/// POST /api/v1/alerts
///
/// Create a manual alert. It enters the lifecycle in `active`, exactly
/// like an evaluator-created alert, and is announced on the global topic.
pub async fn create_alert(
    State(state): State<AppState>,
    Json(input): Json<CreateAlertRequest>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "title must not be empty".to_string(),
        )));
    }

    let create = CreateAlert {
        alert_type: input.alert_type,
        severity: input.severity,
        building_id: input.building_id,
        equipment_id: input.equipment_id,
        audit_id: None,
        reading_id: None,
        title: input.title,
        message: input.message,
        detected_value: input.detected_value,
        threshold_value: input.threshold_value,
        metadata: input
            .metadata
            .unwrap_or_else(|| serde_json::json!({ "origin": "manual" })),
    };
    let alert = AlertRepo::create(&state.pool, &create).await?;

    tracing::info!(
        alert_id = alert.id,
        severity = %alert.severity,
        "Manual alert created"
    );
    state.event_bus.publish(MonitoringEvent::global(
        EVENT_SYSTEM_MONITORING_UPDATE,
        serde_json::json!({
            "alert_id": alert.id,
            "severity": alert.severity,
            "alert_type": alert.alert_type,
        }),
    ));

    Ok((StatusCode::CREATED, Json(DataResponse::new(alert))))
}

// ---------------------------------------------------------------------------
// List / get / patch
// ---------------------------------------------------------------------------

/// GET /api/v1/alerts
///
/// Paginated listing, filterable by building, equipment, type, severity,
/// status and date range.
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertListQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &params.status {
        if gridmon_db::models::status::AlertStatus::parse(status).is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown status filter: {status}"
            ))));
        }
    }
    let alerts = AlertRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse::new(alerts)))
}

/// GET /api/v1/alerts/{id}
pub async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let alert = find_alert(&state.pool, id).await?;
    Ok(Json(DataResponse::new(alert)))
}

/// PATCH /api/v1/alerts/{id}
///
/// Generic field patch restricted to an allow-list (title, message,
/// severity, metadata). Metadata is merged, not replaced.
pub async fn update_alert(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAlert>,
) -> AppResult<impl IntoResponse> {
    let alert = AlertRepo::update_fields(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Alert",
            id,
        }))?;
    Ok(Json(DataResponse::new(alert)))
}

// ---------------------------------------------------------------------------
// Acknowledge / resolve
// ---------------------------------------------------------------------------

/// Request body for `POST /alerts/{id}/acknowledge`.
#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    pub acknowledged_by: String,
}

/// POST /api/v1/alerts/{id}/acknowledge
///
/// Legal from `active` or `escalated`, and only once.
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AcknowledgeRequest>,
) -> AppResult<impl IntoResponse> {
    match AlertRepo::acknowledge(&state.pool, id, &input.acknowledged_by).await? {
        Some(alert) => {
            tracing::info!(alert_id = id, by = %input.acknowledged_by, "Alert acknowledged");
            Ok(Json(DataResponse::new(alert)))
        }
        None => Err(transition_rejected(&state.pool, id, "acknowledge").await),
    }
}

/// Request body for `POST /alerts/{id}/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolved_by: String,
    pub notes: Option<String>,
}

/// POST /api/v1/alerts/{id}/resolve
///
/// Legal from any non-resolved state. An optional note is merged into the
/// alert's metadata under `resolution_notes`.
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ResolveRequest>,
) -> AppResult<impl IntoResponse> {
    match AlertRepo::resolve(&state.pool, id, &input.resolved_by, input.notes.as_deref()).await? {
        Some(alert) => {
            tracing::info!(alert_id = id, by = %input.resolved_by, "Alert resolved");
            Ok(Json(DataResponse::new(alert)))
        }
        None => Err(transition_rejected(&state.pool, id, "resolve").await),
    }
}
