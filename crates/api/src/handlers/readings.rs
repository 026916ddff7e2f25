//! Reading ingestion handler.
//!
//! Stores the reading, then hands the monitoring work (evaluation, alert
//! creation, analysis scheduling, notification) to a detached task. The
//! response is returned before any of that work happens; a monitoring
//! failure can never fail the ingestion request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use gridmon_core::error::CoreError;
use gridmon_core::reading::Reading;
use gridmon_db::repositories::ReadingRepo;

use crate::error::{AppError, AppResult};
use crate::monitor::spawn_monitoring;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/readings
///
/// Ingest one reading. Returns 202 with the stored reading id.
pub async fn ingest_reading(
    State(state): State<AppState>,
    Json(reading): Json<Reading>,
) -> AppResult<impl IntoResponse> {
    if reading.building_id <= 0 {
        return Err(AppError::Core(CoreError::Validation(
            "building_id must be positive".to_string(),
        )));
    }

    let row = ReadingRepo::insert(&state.pool, &reading).await?;
    tracing::debug!(
        reading_id = row.id,
        building_id = row.building_id,
        kind = %row.kind,
        "Reading stored"
    );

    spawn_monitoring(state.clone(), reading, row.id);

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse::new(serde_json::json!({ "reading_id": row.id }))),
    ))
}
