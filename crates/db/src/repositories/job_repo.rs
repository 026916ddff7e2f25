//! Repository for the `background_jobs` table.
//!
//! Status transitions are monotonic and enforced in SQL: claiming only
//! touches pending rows, completion/failure only touch running rows. A
//! retry is a new `create` call made by an external decision-maker; this
//! repository never re-runs a row in place.

use sqlx::PgPool;

use gridmon_core::types::DbId;

use crate::models::job::{Job, JobListQuery, NewJob};
use crate::models::status::JobStatus;

/// Column list for `background_jobs` queries.
const COLUMNS: &str = "\
    id, job_type, status_id, building_id, equipment_id, \
    parameters, result, error_message, progress_percent, \
    created_at, started_at, completed_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides persistence for background jobs.
pub struct JobRepo;

impl JobRepo {
    /// Create a new pending job from validated parameters.
    pub async fn create(pool: &PgPool, input: &NewJob) -> Result<Job, sqlx::Error> {
        let params_json =
            serde_json::to_value(&input.params).unwrap_or(serde_json::Value::Null);
        let query = format!(
            "INSERT INTO background_jobs \
                 (job_type, status_id, building_id, equipment_id, parameters) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(input.params.job_type().as_str())
            .bind(JobStatus::Pending.id())
            .bind(input.params.building_id())
            .bind(input.params.equipment_id())
            .bind(&params_json)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest pending job and mark it running.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent worker instances
    /// can never claim the same row.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE background_jobs \
             SET status_id = $1, started_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM background_jobs \
                 WHERE status_id = $2 \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Running.id())
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Update progress percentage for a running job.
    pub async fn update_progress(
        pool: &PgPool,
        job_id: DbId,
        percent: i16,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE background_jobs SET progress_percent = $2 \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(job_id)
        .bind(percent.clamp(0, 100))
        .bind(JobStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a running job completed with its result payload.
    ///
    /// Returns `false` if the job was not in `running` (the monotonic
    /// transition guard rejected the write).
    pub async fn complete(
        pool: &PgPool,
        job_id: DbId,
        result: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE background_jobs \
             SET status_id = $2, result = $3, progress_percent = 100, \
                 completed_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(job_id)
        .bind(JobStatus::Completed.id())
        .bind(result)
        .bind(JobStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Mark a running job failed with an error message.
    ///
    /// No automatic retry is performed. Returns `false` if the job was not
    /// in `running`.
    pub async fn fail(
        pool: &PgPool,
        job_id: DbId,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE background_jobs \
             SET status_id = $2, error_message = $3, completed_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(error)
        .bind(JobStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM background_jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the most recent jobs, optionally filtered by status/building.
    pub async fn list_recent(
        pool: &PgPool,
        params: &JobListQuery,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if params.status_id.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.building_id.is_some() {
            conditions.push(format!("building_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM background_jobs \
             {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${bind_idx}"
        );

        let mut q = sqlx::query_as::<_, Job>(&query);
        if let Some(v) = params.status_id {
            q = q.bind(v);
        }
        if let Some(v) = params.building_id {
            q = q.bind(v);
        }
        q = q.bind(limit);

        q.fetch_all(pool).await
    }
}
