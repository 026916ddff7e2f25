//! Handlers for the `/jobs` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use gridmon_core::error::CoreError;
use gridmon_core::job::{JobParameters, JobType};
use gridmon_core::types::DbId;
use gridmon_db::models::job::{Job, JobListQuery, NewJob, SubmitJobRequest};
use gridmon_db::repositories::JobRepo;

use crate::engine::WorkerStatusSnapshot;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Payload for `GET /jobs`: recent rows plus worker-loop liveness.
#[derive(Debug, Serialize)]
pub struct JobListing {
    pub jobs: Vec<Job>,
    pub worker: WorkerStatusSnapshot,
}

/// POST /api/v1/jobs
///
/// Submit a new background job. The parameters payload is parsed and
/// validated against the job type before a row is written; the job starts
/// in `pending` and is picked up by the worker loop.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(input): Json<SubmitJobRequest>,
) -> AppResult<impl IntoResponse> {
    let job_type = JobType::parse(&input.job_type)?;
    let params = JobParameters::from_payload(job_type, &input.parameters)?;

    let job = JobRepo::create(&state.pool, &NewJob::new(params)).await?;
    tracing::info!(job_id = job.id, job_type = %job.job_type, "Job submitted");

    Ok((StatusCode::CREATED, Json(DataResponse::new(job))))
}

/// GET /api/v1/jobs
///
/// Most recent jobs (optionally filtered by `status_id` / `building_id`)
/// together with worker liveness, which is distinct from per-job status.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = JobRepo::list_recent(&state.pool, &params).await?;
    let listing = JobListing {
        jobs,
        worker: state.worker_status.snapshot(),
    };
    Ok(Json(DataResponse::new(listing)))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id,
        }))?;
    Ok(Json(DataResponse::new(job)))
}
