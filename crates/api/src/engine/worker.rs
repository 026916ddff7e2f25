//! Background job worker.
//!
//! A single long-lived Tokio task that polls for pending jobs every
//! `poll_interval` and executes them. Claiming uses `SELECT FOR UPDATE
//! SKIP LOCKED` via [`JobRepo::claim_next`] so a second worker instance
//! cannot double-claim. Handlers run under a timeout and a failure (or
//! timeout) writes `failed` with a truncated error message; there is no
//! automatic retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use gridmon_core::job::JobType;
use gridmon_db::models::job::Job;
use gridmon_db::repositories::JobRepo;
use gridmon_events::{EventBus, MonitoringEvent, EVENT_JOB_UPDATE};

use crate::engine::handlers::JobHandler;

/// Maximum stored length of a job failure message, in characters.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Worker loop liveness, shared with the API via [`crate::state::AppState`].
#[derive(Debug, Default)]
pub struct WorkerStatus {
    active: AtomicBool,
    last_poll_ms: AtomicI64,
}

/// Point-in-time view of [`WorkerStatus`] for API responses.
#[derive(Debug, serde::Serialize)]
pub struct WorkerStatusSnapshot {
    /// True while the polling loop is running.
    pub active: bool,
    /// When the loop last polled the queue.
    pub last_poll_at: Option<DateTime<Utc>>,
}

impl WorkerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    fn record_poll(&self) {
        self.last_poll_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerStatusSnapshot {
        let ms = self.last_poll_ms.load(Ordering::Relaxed);
        WorkerStatusSnapshot {
            active: self.active.load(Ordering::Relaxed),
            last_poll_at: (ms > 0).then(|| DateTime::from_timestamp_millis(ms)).flatten(),
        }
    }
}

/// Polling job worker.
pub struct JobWorker {
    pool: PgPool,
    handlers: HashMap<JobType, Box<dyn JobHandler>>,
    event_bus: Arc<EventBus>,
    status: Arc<WorkerStatus>,
    poll_interval: Duration,
    job_timeout: Duration,
}

impl JobWorker {
    pub fn new(
        pool: PgPool,
        handlers: HashMap<JobType, Box<dyn JobHandler>>,
        event_bus: Arc<EventBus>,
        status: Arc<WorkerStatus>,
        poll_interval: Duration,
        job_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            handlers,
            event_bus,
            status,
            poll_interval,
            job_timeout,
        }
    }

    /// Run the worker loop until the cancellation token is triggered.
    ///
    /// Jobs are drained one at a time per tick; a claimed job is always
    /// driven to a terminal state before the next claim.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        self.status.set_active(true);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            job_timeout_secs = self.job_timeout.as_secs(),
            "Job worker started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.status.record_poll();
                    // Drain the backlog before sleeping again.
                    loop {
                        match JobRepo::claim_next(&self.pool).await {
                            Ok(Some(job)) => self.execute(job).await,
                            Ok(None) => break,
                            Err(e) => {
                                tracing::error!(error = %e, "Job claim failed");
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.status.set_active(false);
    }

    /// Execute one claimed job to a terminal state.
    async fn execute(&self, job: Job) {
        tracing::info!(job_id = job.id, job_type = %job.job_type, "Job claimed");

        let outcome = match JobType::parse(&job.job_type) {
            Ok(job_type) => match self.handlers.get(&job_type) {
                Some(handler) => {
                    match tokio::time::timeout(self.job_timeout, handler.run(&self.pool, &job))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(format!(
                            "Handler timed out after {}s",
                            self.job_timeout.as_secs()
                        )
                        .into()),
                    }
                }
                None => Err(format!("No handler registered for {}", job.job_type).into()),
            },
            Err(e) => Err(e.to_string().into()),
        };

        match outcome {
            Ok(result) => {
                match JobRepo::complete(&self.pool, job.id, &result).await {
                    Ok(true) => {
                        tracing::info!(job_id = job.id, "Job completed");
                        self.publish_terminal(&job, "completed");
                    }
                    Ok(false) => {
                        tracing::warn!(job_id = job.id, "Job left running state mid-flight");
                    }
                    Err(e) => {
                        tracing::error!(job_id = job.id, error = %e, "Failed to record completion");
                    }
                }
            }
            Err(e) => {
                let message = truncate_error(&e.to_string());
                tracing::warn!(job_id = job.id, error = %message, "Job handler failed");
                match JobRepo::fail(&self.pool, job.id, &message).await {
                    Ok(true) => self.publish_terminal(&job, "failed"),
                    Ok(false) => {
                        tracing::warn!(job_id = job.id, "Job left running state mid-flight");
                    }
                    Err(e) => {
                        tracing::error!(job_id = job.id, error = %e, "Failed to record failure");
                    }
                }
            }
        }
    }

    /// Push a best-effort job status event toward connected clients.
    fn publish_terminal(&self, job: &Job, status: &str) {
        let payload = serde_json::json!({
            "job_id": job.id,
            "job_type": job.job_type,
            "status": status,
        });
        let event = match job.building_id {
            Some(building_id) => MonitoringEvent::building(building_id, EVENT_JOB_UPDATE, payload),
            None => MonitoringEvent::global(EVENT_JOB_UPDATE, payload),
        };
        self.event_bus.publish(event);
    }
}

/// Truncate an error message to the stored maximum, on a char boundary.
fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        return message.to_string();
    }
    message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_error_is_untouched() {
        assert_eq!(truncate_error("boom"), "boom");
    }

    #[test]
    fn long_error_is_capped_at_500_chars() {
        let long = "x".repeat(1200);
        assert_eq!(truncate_error(&long).chars().count(), 500);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "ü".repeat(600);
        let truncated = truncate_error(&long);
        assert_eq!(truncated.chars().count(), 500);
        assert!(truncated.chars().all(|c| c == 'ü'));
    }

    #[test]
    fn fresh_status_is_inactive_with_no_poll() {
        let status = WorkerStatus::new();
        let snap = status.snapshot();
        assert!(!snap.active);
        assert!(snap.last_poll_at.is_none());
    }

    #[test]
    fn poll_recording_is_visible_in_snapshot() {
        let status = WorkerStatus::new();
        status.set_active(true);
        status.record_poll();

        let snap = status.snapshot();
        assert!(snap.active);
        assert!(snap.last_poll_at.is_some());
    }
}
