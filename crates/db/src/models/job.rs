//! Background job entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gridmon_core::job::JobParameters;
use gridmon_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `background_jobs` table.
///
/// Status transitions are monotonic (pending -> running -> terminal); a
/// retry is a brand-new row, never an in-place re-run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_type: String,
    pub status_id: StatusId,
    pub building_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
    pub parameters: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub progress_percent: i16,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

/// Validated insert DTO. Constructed from [`JobParameters`] so the typed
/// payload has already been checked by the time a row is written.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub params: JobParameters,
}

impl NewJob {
    pub fn new(params: JobParameters) -> Self {
        Self { params }
    }
}

/// Request body for `POST /jobs`.
#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub job_type: String,
    pub parameters: serde_json::Value,
}

/// Query parameters for `GET /jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub status_id: Option<StatusId>,
    pub building_id: Option<DbId>,
    pub limit: Option<i64>,
}
