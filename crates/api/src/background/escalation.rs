//! Escalation sweeper.
//!
//! Periodically promotes unacknowledged high/critical alerts through
//! escalation levels. Candidate selection and the escalating write are
//! both state-checked in SQL, so a sweep racing an acknowledge (or a
//! second sweep) loses cleanly instead of double-escalating.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use gridmon_db::repositories::AlertRepo;
use gridmon_events::{EventBus, MonitoringEvent, EVENT_ALERT_ESCALATED};

/// Per-run candidate cap; bounds the cost of one sweep.
const SWEEP_BATCH_SIZE: i64 = 50;

/// Outcome of one sweep run.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    /// Candidates examined.
    pub processed: usize,
    /// Candidates actually escalated.
    pub escalated: usize,
    /// Candidates whose escalation write errored.
    pub failed: usize,
    /// One message per failed candidate.
    pub errors: Vec<String>,
}

/// Run the sweeper loop until the cancellation token is triggered.
pub async fn run(
    pool: PgPool,
    event_bus: Arc<EventBus>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        batch = SWEEP_BATCH_SIZE,
        "Escalation sweeper started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Escalation sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                match run_once(&pool, &event_bus).await {
                    Ok(report) if report.processed > 0 => {
                        tracing::info!(
                            processed = report.processed,
                            escalated = report.escalated,
                            failed = report.failed,
                            "Escalation sweep finished"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Escalation sweep failed");
                    }
                }
            }
        }
    }
}

/// One sweep: select candidates, escalate each independently.
///
/// A failure on one candidate is recorded and does not abort the batch.
/// The escalating UPDATE re-checks status, acknowledgement, and level, so
/// a candidate that changed since selection is skipped, not corrupted.
pub async fn run_once(pool: &PgPool, event_bus: &EventBus) -> Result<SweepReport, sqlx::Error> {
    let candidates = AlertRepo::list_escalation_candidates(pool, SWEEP_BATCH_SIZE).await?;

    let mut report = SweepReport {
        processed: candidates.len(),
        ..Default::default()
    };

    for alert in candidates {
        let ceiling = alert.severity_enum().escalation_ceiling();
        match AlertRepo::escalate(pool, alert.id, alert.escalation_level, ceiling).await {
            Ok(Some(escalated)) => {
                report.escalated += 1;
                tracing::info!(
                    alert_id = escalated.id,
                    level = escalated.escalation_level,
                    severity = %escalated.severity,
                    "Alert escalated"
                );
                if let Some(building_id) = escalated.building_id {
                    event_bus.publish(MonitoringEvent::building(
                        building_id,
                        EVENT_ALERT_ESCALATED,
                        serde_json::json!({
                            "alert_id": escalated.id,
                            "escalation_level": escalated.escalation_level,
                            "severity": escalated.severity,
                        }),
                    ));
                }
            }
            // Acknowledged, re-escalated, or resolved since selection.
            Ok(None) => {
                tracing::debug!(alert_id = alert.id, "Escalation skipped, state changed");
            }
            Err(e) => {
                report.failed += 1;
                report
                    .errors
                    .push(format!("alert {}: {e}", alert.id));
                tracing::error!(alert_id = alert.id, error = %e, "Escalation write failed");
            }
        }
    }

    Ok(report)
}
