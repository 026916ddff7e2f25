//! Handlers for the `/thresholds` resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use gridmon_core::error::CoreError;
use gridmon_db::models::threshold::{CreateThreshold, ThresholdListQuery};
use gridmon_db::repositories::ThresholdRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Accepted `threshold_type` wire values.
const THRESHOLD_TYPES: [&str; 3] = ["absolute", "percentage", "deviation"];

/// GET /api/v1/thresholds
///
/// List configured thresholds, filterable by building, equipment,
/// parameter type and enabled flag.
pub async fn list_thresholds(
    State(state): State<AppState>,
    Query(params): Query<ThresholdListQuery>,
) -> AppResult<impl IntoResponse> {
    let thresholds = ThresholdRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse::new(thresholds)))
}

/// POST /api/v1/thresholds
///
/// Create a threshold. A second enabled threshold for the same
/// (parameter type, building, equipment) scope is a 409.
pub async fn create_threshold(
    State(state): State<AppState>,
    Json(input): Json<CreateThreshold>,
) -> AppResult<impl IntoResponse> {
    validate(&input)?;

    let parameter_type = input.parameter_type.as_str();
    if ThresholdRepo::duplicate_exists(
        &state.pool,
        parameter_type,
        input.building_id,
        input.equipment_id,
    )
    .await?
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "An enabled {parameter_type} threshold already exists for this scope"
        ))));
    }

    let threshold = ThresholdRepo::create(&state.pool, &input).await?;
    tracing::info!(
        threshold_id = threshold.id,
        parameter_type,
        building_id = ?threshold.building_id,
        "Threshold created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(threshold))))
}

fn validate(input: &CreateThreshold) -> AppResult<()> {
    if input.min_value.is_none() && input.max_value.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one of min_value or max_value is required".to_string(),
        )));
    }
    if let (Some(min), Some(max)) = (input.min_value, input.max_value) {
        if min >= max {
            return Err(AppError::Core(CoreError::Validation(format!(
                "min_value ({min}) must be below max_value ({max})"
            ))));
        }
    }
    if !THRESHOLD_TYPES.contains(&input.threshold_type.as_str()) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown threshold_type: {}",
            input.threshold_type
        ))));
    }
    if let Some(interval) = input.escalation_interval_minutes {
        if interval <= 0 {
            return Err(AppError::Core(CoreError::Validation(
                "escalation_interval_minutes must be positive".to_string(),
            )));
        }
    }
    Ok(())
}
