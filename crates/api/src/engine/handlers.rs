//! Per-type job handlers.
//!
//! Each handler receives the claimed job row, reads whatever it needs from
//! the database, and returns a JSON result that the worker merges into the
//! row on completion. Handler errors are captured into `error_message` and
//! never propagate to the worker loop.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use gridmon_core::job::{JobParameters, JobType};
use gridmon_db::models::job::Job;
use gridmon_db::models::status::AlertStatus;
use gridmon_db::repositories::{JobRepo, ReadingRepo};

/// Error type for handler business logic.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A job handler for one [`JobType`].
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Execute the job and return the result payload to store on the row.
    async fn run(&self, pool: &PgPool, job: &Job) -> Result<serde_json::Value, HandlerError>;
}

/// Build the handler registry covering every job type.
pub fn handler_registry() -> HashMap<JobType, Box<dyn JobHandler>> {
    let mut registry: HashMap<JobType, Box<dyn JobHandler>> = HashMap::new();
    registry.insert(JobType::AnomalyDetection, Box::new(AnomalyDetection));
    registry.insert(JobType::EfficiencyAnalysis, Box::new(EfficiencyAnalysis));
    registry.insert(JobType::MaintenancePrediction, Box::new(MaintenancePrediction));
    registry.insert(JobType::ComplianceCheck, Box::new(ComplianceCheck));
    registry.insert(JobType::AnalyticsProcessing, Box::new(AnalyticsProcessing));
    registry
}

/// Parse the stored parameters back into their typed form.
fn typed_params(job: &Job) -> Result<JobParameters, HandlerError> {
    let params: JobParameters = serde_json::from_value(job.parameters.clone())?;
    Ok(params)
}

/// Consumption statistics over a window of stored energy readings.
async fn consumption_stats(
    pool: &PgPool,
    building_id: i64,
    hours: i64,
) -> Result<(i64, Option<f64>, Option<f64>), sqlx::Error> {
    sqlx::query_as::<_, (i64, Option<f64>, Option<f64>)>(
        "SELECT COUNT(*), \
                AVG((payload->>'consumption_kwh')::double precision), \
                MAX((payload->>'consumption_kwh')::double precision) \
         FROM readings \
         WHERE building_id = $1 AND kind = 'energy' AND recorded_at >= $2",
    )
    .bind(building_id)
    .bind(Utc::now() - Duration::hours(hours))
    .fetch_one(pool)
    .await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Flags buildings whose recent consumption deviates from their baseline.
struct AnomalyDetection;

#[async_trait]
impl JobHandler for AnomalyDetection {
    async fn run(&self, pool: &PgPool, job: &Job) -> Result<serde_json::Value, HandlerError> {
        let JobParameters::AnomalyDetection {
            building_id,
            lookback_hours,
        } = typed_params(job)?
        else {
            return Err("parameters do not match job type".into());
        };

        let (sample_count, avg, max) =
            consumption_stats(pool, building_id, lookback_hours).await?;

        // Flag the window when the peak is more than double the mean.
        let anomalous = match (avg, max) {
            (Some(avg), Some(max)) if avg > 0.0 => max > avg * 2.0,
            _ => false,
        };

        Ok(serde_json::json!({
            "building_id": building_id,
            "lookback_hours": lookback_hours,
            "sample_count": sample_count,
            "avg_consumption_kwh": avg,
            "max_consumption_kwh": max,
            "anomalous": anomalous,
        }))
    }
}

/// Scores consumption efficiency over a multi-day period.
struct EfficiencyAnalysis;

#[async_trait]
impl JobHandler for EfficiencyAnalysis {
    async fn run(&self, pool: &PgPool, job: &Job) -> Result<serde_json::Value, HandlerError> {
        let JobParameters::EfficiencyAnalysis {
            building_id,
            period_days,
        } = typed_params(job)?
        else {
            return Err("parameters do not match job type".into());
        };

        let (sample_count, avg, max) =
            consumption_stats(pool, building_id, period_days * 24).await?;

        // Peak-to-average ratio as a crude load-factor proxy.
        let load_factor = match (avg, max) {
            (Some(avg), Some(max)) if max > 0.0 => Some(avg / max),
            _ => None,
        };

        Ok(serde_json::json!({
            "building_id": building_id,
            "period_days": period_days,
            "sample_count": sample_count,
            "load_factor": load_factor,
        }))
    }
}

/// Estimates remaining service hours from accumulated equipment runtime.
struct MaintenancePrediction;

/// Service interval assumed when no equipment-specific schedule exists.
const SERVICE_INTERVAL_HOURS: f64 = 8760.0;

#[async_trait]
impl JobHandler for MaintenancePrediction {
    async fn run(&self, pool: &PgPool, job: &Job) -> Result<serde_json::Value, HandlerError> {
        let JobParameters::MaintenancePrediction { equipment_id } = typed_params(job)? else {
            return Err("parameters do not match job type".into());
        };

        let runtime: Option<f64> = sqlx::query_scalar(
            "SELECT (payload->>'runtime_hours')::double precision \
             FROM readings \
             WHERE equipment_id = $1 AND kind = 'equipment' \
               AND payload->>'runtime_hours' IS NOT NULL \
             ORDER BY recorded_at DESC LIMIT 1",
        )
        .bind(equipment_id)
        .fetch_optional(pool)
        .await?
        .flatten();

        let hours_to_service =
            runtime.map(|h| (SERVICE_INTERVAL_HOURS - h % SERVICE_INTERVAL_HOURS).max(0.0));

        Ok(serde_json::json!({
            "equipment_id": equipment_id,
            "runtime_hours": runtime,
            "hours_to_service": hours_to_service,
        }))
    }
}

/// Scores a building by its open alert load.
struct ComplianceCheck;

#[async_trait]
impl JobHandler for ComplianceCheck {
    async fn run(&self, pool: &PgPool, job: &Job) -> Result<serde_json::Value, HandlerError> {
        let JobParameters::ComplianceCheck { building_id } = typed_params(job)? else {
            return Err("parameters do not match job type".into());
        };

        let open_alerts: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM alerts \
             WHERE building_id = $1 AND status_id <> $2",
        )
        .bind(building_id)
        .bind(AlertStatus::Resolved.id())
        .fetch_one(pool)
        .await?;

        // 100 minus 5 points per open alert, floored at zero.
        let score = (100 - open_alerts * 5).max(0);

        Ok(serde_json::json!({
            "building_id": building_id,
            "open_alerts": open_alerts,
            "compliance_score": score,
        }))
    }
}

/// Aggregates a building's readings over a trailing window.
struct AnalyticsProcessing;

#[async_trait]
impl JobHandler for AnalyticsProcessing {
    async fn run(&self, pool: &PgPool, job: &Job) -> Result<serde_json::Value, HandlerError> {
        let JobParameters::AnalyticsProcessing {
            building_id,
            window_hours,
        } = typed_params(job)?
        else {
            return Err("parameters do not match job type".into());
        };

        let since = Utc::now() - Duration::hours(window_hours);
        let energy_count = ReadingRepo::count_since(pool, building_id, "energy", since).await?;
        JobRepo::update_progress(pool, job.id, 33).await?;
        let pq_count =
            ReadingRepo::count_since(pool, building_id, "power_quality", since).await?;
        JobRepo::update_progress(pool, job.id, 66).await?;
        let equipment_count =
            ReadingRepo::count_since(pool, building_id, "equipment", since).await?;

        Ok(serde_json::json!({
            "building_id": building_id,
            "window_hours": window_hours,
            "readings": {
                "energy": energy_count,
                "power_quality": pq_count,
                "equipment": equipment_count,
            },
        }))
    }
}
