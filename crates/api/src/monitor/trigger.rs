//! Monitoring trigger: the work that runs after a reading is stored.
//!
//! For one reading, in order: evaluate thresholds and persist violations
//! as alerts, decide whether to schedule deferred analysis (throttled and
//! gated on data sufficiency), then push best-effort events. Every error
//! here is logged and swallowed; a monitoring failure must never fail the
//! ingestion request that carried the reading.

use std::time::Instant;

use chrono::{Duration, Utc};

use gridmon_core::alert::{AlertCandidate, AlertType};
use gridmon_core::evaluator;
use gridmon_core::job::JobParameters;
use gridmon_core::reading::{ParameterKind, Reading};
use gridmon_core::throttle::CheckKind;
use gridmon_core::types::DbId;
use gridmon_db::models::alert::CreateAlert;
use gridmon_db::models::job::NewJob;
use gridmon_db::models::monitoring_log::CreateMonitoringLog;
use gridmon_db::repositories::{
    AlertRepo, JobRepo, MonitoringLogRepo, ReadingRepo, ThresholdRepo,
};
use gridmon_events::{
    MonitoringEvent, EVENT_ENERGY_UPDATE, EVENT_MAINTENANCE_ALERT, EVENT_MONITORING_UPDATE,
    EVENT_POWER_QUALITY_UPDATE, EVENT_SYSTEM_MONITORING_UPDATE,
};

use crate::state::AppState;

/// Minimum stored energy readings in the trailing hour before the first
/// anomaly analysis is scheduled for a building.
const MIN_ENERGY_SAMPLES_PER_HOUR: i64 = 10;

/// Trailing window for the scheduled analytics pass, in hours.
const ANALYTICS_WINDOW_HOURS: i64 = 24;

/// Default period for a scheduled efficiency analysis job.
const EFFICIENCY_PERIOD_DAYS: i64 = 7;

/// Run the monitoring pass for a stored reading as a detached task.
///
/// The caller does not await the work; ordering within the pass is
/// alert creation, then job scheduling, then notification publish.
pub fn spawn_monitoring(state: AppState, reading: Reading, reading_id: DbId) {
    tokio::spawn(async move {
        if let Err(e) = process(&state, &reading, reading_id).await {
            tracing::error!(
                building_id = reading.building_id,
                error = %e,
                "Monitoring pass failed"
            );
            let log = CreateMonitoringLog {
                building_id: Some(reading.building_id),
                result: "error".to_string(),
                details: serde_json::json!({ "error": e.to_string() }),
                alert_count: 0,
                duration_ms: 0,
            };
            if let Err(e) = MonitoringLogRepo::insert(&state.pool, &log).await {
                tracing::error!(error = %e, "Failed to record monitoring error");
            }
        }
    });
}

async fn process(
    state: &AppState,
    reading: &Reading,
    reading_id: DbId,
) -> Result<(), sqlx::Error> {
    let started = Instant::now();

    // 1. Evaluate against built-in rules and configured thresholds.
    let thresholds = ThresholdRepo::get_enabled_for(
        &state.pool,
        reading.building_id,
        reading.equipment_id,
        reading.data.kind().as_str(),
    )
    .await?;
    let specs: Vec<_> = thresholds.iter().map(|t| t.to_spec()).collect();
    let candidates = evaluator::evaluate(reading, &specs);

    // 2. Persist violations as alerts.
    let mut alerts = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let alert = AlertRepo::create(&state.pool, &to_create(candidate, reading, reading_id))
            .await?;
        tracing::info!(
            alert_id = alert.id,
            building_id = reading.building_id,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            "Alert created"
        );
        alerts.push(alert);
    }

    // 3. Schedule deferred analysis, throttled per (check, building).
    schedule_analysis(state, reading).await?;

    // 4. Best-effort notification publish.
    publish_events(state, reading, &candidates);

    let log = CreateMonitoringLog {
        building_id: Some(reading.building_id),
        result: "ok".to_string(),
        details: serde_json::json!({
            "reading_id": reading_id,
            "kind": reading.data.kind().as_str(),
        }),
        alert_count: alerts.len() as i32,
        duration_ms: started.elapsed().as_millis() as i64,
    };
    MonitoringLogRepo::insert(&state.pool, &log).await?;

    Ok(())
}

fn to_create(candidate: &AlertCandidate, reading: &Reading, reading_id: DbId) -> CreateAlert {
    CreateAlert {
        alert_type: candidate.alert_type,
        severity: candidate.severity,
        building_id: Some(reading.building_id),
        equipment_id: reading.equipment_id,
        audit_id: None,
        reading_id: Some(reading_id),
        title: candidate.title.clone(),
        message: candidate.message.clone(),
        detected_value: candidate.detected_value,
        threshold_value: candidate.threshold_value,
        metadata: serde_json::json!({ "origin": "evaluator" }),
    }
}

/// Decide which deferred analyses to enqueue for this reading.
///
/// The throttle prevents repeated scheduling inside a check's cadence;
/// the sample-count gate prevents premature scheduling before a building
/// has produced enough data to analyze. The throttle key is recorded only
/// after the job row is written, so a failed insert stays retryable; a
/// race between two readings for the same building costs at worst one
/// extra job.
///
/// The hourly energy check schedules one `analytics_processing` job whose
/// window covers anomaly detection; standalone `anomaly_detection` jobs
/// are operator-submitted.
async fn schedule_analysis(state: &AppState, reading: &Reading) -> Result<(), sqlx::Error> {
    let building_id = reading.building_id;

    match reading.data.kind() {
        ParameterKind::Energy => {
            let hour_ago = Utc::now() - Duration::hours(1);
            let samples =
                ReadingRepo::count_since(&state.pool, building_id, "energy", hour_ago).await?;
            if samples < MIN_ENERGY_SAMPLES_PER_HOUR {
                tracing::debug!(
                    building_id,
                    samples,
                    "Insufficient samples, skipping analysis scheduling"
                );
                return Ok(());
            }

            if !is_throttled(state, CheckKind::AnomalyDetection, building_id) {
                let params = JobParameters::AnalyticsProcessing {
                    building_id,
                    window_hours: ANALYTICS_WINDOW_HOURS,
                };
                let job = JobRepo::create(&state.pool, &NewJob::new(params)).await?;
                record_scheduled(state, CheckKind::AnomalyDetection, building_id);
                tracing::info!(job_id = job.id, building_id, "Analytics processing scheduled");
            }

            if !is_throttled(state, CheckKind::EfficiencyAnalysis, building_id) {
                let params = JobParameters::EfficiencyAnalysis {
                    building_id,
                    period_days: EFFICIENCY_PERIOD_DAYS,
                };
                let job = JobRepo::create(&state.pool, &NewJob::new(params)).await?;
                record_scheduled(state, CheckKind::EfficiencyAnalysis, building_id);
                tracing::info!(job_id = job.id, building_id, "Efficiency analysis scheduled");
            }
        }
        ParameterKind::Equipment => {
            if let Some(equipment_id) = reading.equipment_id {
                if !is_throttled(state, CheckKind::MaintenancePrediction, building_id) {
                    let params = JobParameters::MaintenancePrediction { equipment_id };
                    let job = JobRepo::create(&state.pool, &NewJob::new(params)).await?;
                    record_scheduled(state, CheckKind::MaintenancePrediction, building_id);
                    tracing::info!(
                        job_id = job.id,
                        equipment_id,
                        "Maintenance prediction scheduled"
                    );
                }
            }
        }
        ParameterKind::PowerQuality => {}
    }

    Ok(())
}

/// Consult the throttle; a poisoned lock counts as throttled.
fn is_throttled(state: &AppState, kind: CheckKind, building_id: DbId) -> bool {
    match state.throttle.lock() {
        Ok(cache) => cache.is_throttled(kind, building_id, Utc::now()),
        Err(e) => {
            tracing::error!(error = %e, "Throttle cache lock poisoned");
            true
        }
    }
}

/// Record a scheduling decision after its job row has been written.
fn record_scheduled(state: &AppState, kind: CheckKind, building_id: DbId) {
    match state.throttle.lock() {
        Ok(mut cache) => cache.record(kind, building_id, Utc::now()),
        Err(e) => tracing::error!(error = %e, "Throttle cache lock poisoned"),
    }
}

/// Publish the raw update and any generated alerts.
fn publish_events(state: &AppState, reading: &Reading, candidates: &[AlertCandidate]) {
    let building_id = reading.building_id;

    let update_event = match reading.data.kind() {
        ParameterKind::Energy => EVENT_ENERGY_UPDATE,
        ParameterKind::PowerQuality => EVENT_POWER_QUALITY_UPDATE,
        ParameterKind::Equipment => EVENT_MONITORING_UPDATE,
    };
    let reading_payload = match serde_json::to_value(reading) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize reading for publish");
            return;
        }
    };
    state
        .event_bus
        .publish(MonitoringEvent::building(building_id, update_event, reading_payload));

    for candidate in candidates {
        let payload = serde_json::json!({
            "building_id": building_id,
            "equipment_id": reading.equipment_id,
            "alert_type": candidate.alert_type.as_str(),
            "severity": candidate.severity.as_str(),
            "title": candidate.title,
        });

        if matches!(
            candidate.alert_type,
            AlertType::EquipmentFailure | AlertType::MaintenanceDue
        ) {
            state.event_bus.publish(MonitoringEvent::building(
                building_id,
                EVENT_MAINTENANCE_ALERT,
                payload.clone(),
            ));
        }

        state
            .event_bus
            .publish(MonitoringEvent::global(EVENT_SYSTEM_MONITORING_UPDATE, payload));
    }
}
