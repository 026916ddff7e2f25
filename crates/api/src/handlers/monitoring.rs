//! Monitoring log and manual sweep handlers.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use gridmon_db::repositories::MonitoringLogRepo;

use crate::background::escalation;
use crate::error::AppResult;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/monitoring/logs
///
/// Most recent monitoring pass logs, newest first.
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let logs = MonitoringLogRepo::list_recent(&state.pool, params.limit.unwrap_or(50)).await?;
    Ok(Json(DataResponse::new(logs)))
}

/// POST /api/v1/monitoring/escalation-sweep
///
/// Run one escalation sweep immediately and return its report. Safe to
/// call while the periodic sweeper is running; the escalating writes are
/// state-checked, so overlapping sweeps cannot double-escalate.
pub async fn trigger_sweep(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let report = escalation::run_once(&state.pool, &state.event_bus).await?;
    tracing::info!(
        processed = report.processed,
        escalated = report.escalated,
        failed = report.failed,
        "Manual escalation sweep finished"
    );
    Ok(Json(DataResponse::new(report)))
}
