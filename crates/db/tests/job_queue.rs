//! Integration tests for the durable background job queue.
//!
//! - FIFO claim with `FOR UPDATE SKIP LOCKED`
//! - Monotonic status transitions enforced in SQL
//! - Progress updates only while running

use sqlx::PgPool;

use gridmon_core::job::JobParameters;
use gridmon_db::models::job::{JobListQuery, NewJob};
use gridmon_db::models::status::JobStatus;
use gridmon_db::repositories::JobRepo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn anomaly_job(building_id: i64) -> NewJob {
    NewJob::new(JobParameters::AnomalyDetection {
        building_id,
        lookback_hours: 24,
    })
}

// ---------------------------------------------------------------------------
// Creation and claiming
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_lands_pending_with_typed_parameters(pool: PgPool) {
    let job = JobRepo::create(&pool, &anomaly_job(7)).await.unwrap();

    assert_eq!(job.status_id, JobStatus::Pending.id());
    assert_eq!(job.job_type, "anomaly_detection");
    assert_eq!(job.building_id, Some(7));
    assert_eq!(job.progress_percent, 0);
    assert_eq!(
        job.parameters["anomaly_detection"]["lookback_hours"],
        serde_json::json!(24)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_claim_takes_oldest_pending_first(pool: PgPool) {
    let first = JobRepo::create(&pool, &anomaly_job(1)).await.unwrap();
    let second = JobRepo::create(&pool, &anomaly_job(2)).await.unwrap();

    let claimed = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(claimed.id, first.id);
    assert_eq!(claimed.status_id, JobStatus::Running.id());
    assert!(claimed.started_at.is_some());

    let claimed = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(claimed.id, second.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_claim_on_empty_queue_yields_nothing(pool: PgPool) {
    let claimed = JobRepo::claim_next(&pool).await.unwrap();
    assert!(claimed.is_none());
}

// ---------------------------------------------------------------------------
// Monotonic transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_complete_writes_result_and_is_final(pool: PgPool) {
    JobRepo::create(&pool, &anomaly_job(1)).await.unwrap();
    let job = JobRepo::claim_next(&pool).await.unwrap().unwrap();

    let result = serde_json::json!({ "anomalies": 2 });
    assert!(JobRepo::complete(&pool, job.id, &result).await.unwrap());

    let stored = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(stored.status_id, JobStatus::Completed.id());
    assert_eq!(stored.progress_percent, 100);
    assert_eq!(stored.result, Some(result.clone()));
    assert!(stored.completed_at.is_some());

    // Completed is terminal: neither completion nor failure may rewrite it.
    assert!(!JobRepo::complete(&pool, job.id, &result).await.unwrap());
    assert!(!JobRepo::fail(&pool, job.id, "late failure").await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fail_records_error_and_is_final(pool: PgPool) {
    JobRepo::create(&pool, &anomaly_job(1)).await.unwrap();
    let job = JobRepo::claim_next(&pool).await.unwrap().unwrap();

    assert!(JobRepo::fail(&pool, job.id, "upstream timed out").await.unwrap());

    let stored = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(stored.status_id, JobStatus::Failed.id());
    assert_eq!(stored.error_message.as_deref(), Some("upstream timed out"));

    assert!(!JobRepo::complete(&pool, job.id, &serde_json::json!({}))
        .await
        .unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pending_job_cannot_jump_to_terminal(pool: PgPool) {
    let job = JobRepo::create(&pool, &anomaly_job(1)).await.unwrap();

    assert!(!JobRepo::complete(&pool, job.id, &serde_json::json!({}))
        .await
        .unwrap());
    assert!(!JobRepo::fail(&pool, job.id, "never ran").await.unwrap());

    let stored = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(stored.status_id, JobStatus::Pending.id());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_progress_updates_only_while_running(pool: PgPool) {
    let job = JobRepo::create(&pool, &anomaly_job(1)).await.unwrap();

    // Still pending: ignored.
    JobRepo::update_progress(&pool, job.id, 40).await.unwrap();
    let stored = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(stored.progress_percent, 0);

    let running = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    JobRepo::update_progress(&pool, running.id, 40).await.unwrap();
    let stored = JobRepo::find_by_id(&pool, running.id).await.unwrap().unwrap();
    assert_eq!(stored.progress_percent, 40);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_list_filters_by_status_and_building(pool: PgPool) {
    JobRepo::create(&pool, &anomaly_job(1)).await.unwrap();
    JobRepo::create(&pool, &anomaly_job(2)).await.unwrap();
    let running = JobRepo::claim_next(&pool).await.unwrap().unwrap();

    let pending = JobRepo::list_recent(
        &pool,
        &JobListQuery {
            status_id: Some(JobStatus::Pending.id()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].building_id, Some(2));

    let for_building = JobRepo::list_recent(
        &pool,
        &JobListQuery {
            building_id: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(for_building.len(), 1);
    assert_eq!(for_building[0].id, running.id);
}
