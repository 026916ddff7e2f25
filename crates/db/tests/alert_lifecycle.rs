//! Integration tests for the alert lifecycle state machine.
//!
//! Exercises the repository layer against a real database:
//! - Creation lands in `active` at escalation level 0
//! - Acknowledge is legal from active/escalated and only once
//! - Resolve is legal from any non-resolved state and merges notes
//! - Escalate is a compare-and-swap bounded by the severity ceiling
//! - Candidate selection honours grace window, ceiling and ordering

use sqlx::PgPool;

use gridmon_core::alert::{AlertType, Severity};
use gridmon_db::models::alert::{CreateAlert, UpdateAlert};
use gridmon_db::models::status::AlertStatus;
use gridmon_db::repositories::AlertRepo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_alert(severity: Severity, building_id: i64) -> CreateAlert {
    CreateAlert {
        alert_type: AlertType::ThresholdExceeded,
        severity,
        building_id: Some(building_id),
        equipment_id: None,
        audit_id: None,
        reading_id: None,
        title: "Voltage out of range".to_string(),
        message: "Measured 261.0 V against limit 253.0 V".to_string(),
        detected_value: Some(261.0),
        threshold_value: Some(253.0),
        metadata: serde_json::json!({ "source": "test" }),
    }
}

/// Shift an alert's reference timestamps into the past so grace-window
/// logic can be exercised without sleeping.
async fn backdate(pool: &PgPool, alert_id: i64, minutes: i64) {
    sqlx::query(
        "UPDATE alerts SET \
            created_at = created_at - make_interval(mins => $2), \
            escalated_at = escalated_at - make_interval(mins => $2) \
         WHERE id = $1",
    )
    .bind(alert_id)
    .bind(minutes as i32)
    .execute(pool)
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Creation and patching
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_lands_active_at_level_zero(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::High, 1))
        .await
        .unwrap();

    assert_eq!(alert.status_id, AlertStatus::Active.id());
    assert_eq!(alert.escalation_level, 0);
    assert!(alert.acknowledged_at.is_none());
    assert!(alert.escalated_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_merges_metadata_instead_of_replacing(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::Medium, 1))
        .await
        .unwrap();

    let patched = AlertRepo::update_fields(
        &pool,
        alert.id,
        &UpdateAlert {
            title: Some("Updated title".to_string()),
            message: None,
            severity: None,
            metadata: Some(serde_json::json!({ "reviewed": true })),
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(patched.title, "Updated title");
    assert_eq!(patched.message, alert.message);
    assert_eq!(patched.metadata["source"], "test");
    assert_eq!(patched.metadata["reviewed"], true);
}

// ---------------------------------------------------------------------------
// Acknowledge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_acknowledge_succeeds_once_then_rejects(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::High, 1))
        .await
        .unwrap();

    let acked = AlertRepo::acknowledge(&pool, alert.id, "operator@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(acked.status_id, AlertStatus::Acknowledged.id());
    assert_eq!(acked.acknowledged_by.as_deref(), Some("operator@example.com"));
    assert!(acked.acknowledged_at.is_some());

    // Second acknowledgement matches zero rows.
    let again = AlertRepo::acknowledge(&pool, alert.id, "other@example.com")
        .await
        .unwrap();
    assert!(again.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_acknowledge_is_legal_from_escalated(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::Critical, 1))
        .await
        .unwrap();
    backdate(&pool, alert.id, 10).await;

    let escalated = AlertRepo::escalate(&pool, alert.id, 0, 3)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(escalated.status_id, AlertStatus::Escalated.id());

    let acked = AlertRepo::acknowledge(&pool, alert.id, "oncall@example.com")
        .await
        .unwrap();
    assert!(acked.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_acknowledge_rejected_after_resolve(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::High, 1))
        .await
        .unwrap();

    AlertRepo::resolve(&pool, alert.id, "operator@example.com", None)
        .await
        .unwrap()
        .unwrap();

    let acked = AlertRepo::acknowledge(&pool, alert.id, "operator@example.com")
        .await
        .unwrap();
    assert!(acked.is_none());
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_resolve_merges_notes_and_keeps_prior_metadata(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::High, 1))
        .await
        .unwrap();

    let resolved = AlertRepo::resolve(
        &pool,
        alert.id,
        "operator@example.com",
        Some("Transformer tap changed"),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(resolved.status_id, AlertStatus::Resolved.id());
    assert!(resolved.resolved_at.is_some());
    assert_eq!(resolved.metadata["resolution_notes"], "Transformer tap changed");
    assert_eq!(resolved.metadata["source"], "test");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resolve_without_note_leaves_metadata_untouched(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::Low, 1))
        .await
        .unwrap();

    let resolved = AlertRepo::resolve(&pool, alert.id, "operator@example.com", None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(resolved.metadata, serde_json::json!({ "source": "test" }));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resolve_is_terminal(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::High, 1))
        .await
        .unwrap();

    AlertRepo::resolve(&pool, alert.id, "a@example.com", None)
        .await
        .unwrap()
        .unwrap();

    let again = AlertRepo::resolve(&pool, alert.id, "b@example.com", None)
        .await
        .unwrap();
    assert!(again.is_none());
}

// ---------------------------------------------------------------------------
// Escalate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_escalate_increments_level_and_sets_status(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::Critical, 1))
        .await
        .unwrap();

    let escalated = AlertRepo::escalate(&pool, alert.id, 0, 3)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(escalated.escalation_level, 1);
    assert_eq!(escalated.status_id, AlertStatus::Escalated.id());
    assert!(escalated.escalated_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_escalate_with_stale_level_matches_nothing(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::Critical, 1))
        .await
        .unwrap();

    AlertRepo::escalate(&pool, alert.id, 0, 3).await.unwrap().unwrap();

    // A second sweep still holding level 0 loses the race.
    let stale = AlertRepo::escalate(&pool, alert.id, 0, 3).await.unwrap();
    assert!(stale.is_none());

    let current = AlertRepo::find_by_id(&pool, alert.id).await.unwrap().unwrap();
    assert_eq!(current.escalation_level, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_escalate_stops_at_ceiling(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::High, 1))
        .await
        .unwrap();

    AlertRepo::escalate(&pool, alert.id, 0, 2).await.unwrap().unwrap();
    AlertRepo::escalate(&pool, alert.id, 1, 2).await.unwrap().unwrap();

    let over = AlertRepo::escalate(&pool, alert.id, 2, 2).await.unwrap();
    assert!(over.is_none());

    let current = AlertRepo::find_by_id(&pool, alert.id).await.unwrap().unwrap();
    assert_eq!(current.escalation_level, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_escalate_rejected_once_acknowledged(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::Critical, 1))
        .await
        .unwrap();

    AlertRepo::acknowledge(&pool, alert.id, "operator@example.com")
        .await
        .unwrap()
        .unwrap();

    let escalated = AlertRepo::escalate(&pool, alert.id, 0, 3).await.unwrap();
    assert!(escalated.is_none());
}

// ---------------------------------------------------------------------------
// Candidate selection
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_candidates_respect_grace_window(pool: PgPool) {
    let fresh = AlertRepo::create(&pool, &new_alert(Severity::Critical, 1))
        .await
        .unwrap();
    let overdue = AlertRepo::create(&pool, &new_alert(Severity::Critical, 2))
        .await
        .unwrap();
    backdate(&pool, overdue.id, 10).await;

    let ids: Vec<i64> = AlertRepo::list_escalation_candidates(&pool, 50)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();

    assert!(ids.contains(&overdue.id));
    assert!(!ids.contains(&fresh.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_candidates_exclude_low_and_medium(pool: PgPool) {
    let medium = AlertRepo::create(&pool, &new_alert(Severity::Medium, 1))
        .await
        .unwrap();
    backdate(&pool, medium.id, 60).await;

    let candidates = AlertRepo::list_escalation_candidates(&pool, 50)
        .await
        .unwrap();
    assert!(candidates.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_candidates_order_critical_before_older_high(pool: PgPool) {
    let high = AlertRepo::create(&pool, &new_alert(Severity::High, 1))
        .await
        .unwrap();
    backdate(&pool, high.id, 30).await;

    let critical = AlertRepo::create(&pool, &new_alert(Severity::Critical, 2))
        .await
        .unwrap();
    backdate(&pool, critical.id, 10).await;

    let ids: Vec<i64> = AlertRepo::list_escalation_candidates(&pool, 50)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();

    assert_eq!(ids, vec![critical.id, high.id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_candidates_stop_at_severity_ceiling(pool: PgPool) {
    let alert = AlertRepo::create(&pool, &new_alert(Severity::High, 1))
        .await
        .unwrap();
    backdate(&pool, alert.id, 10).await;
    AlertRepo::escalate(&pool, alert.id, 0, 2).await.unwrap().unwrap();
    backdate(&pool, alert.id, 10).await;
    AlertRepo::escalate(&pool, alert.id, 1, 2).await.unwrap().unwrap();
    backdate(&pool, alert.id, 10).await;

    // High ceiling is 2; the alert is past its grace window but maxed out.
    let candidates = AlertRepo::list_escalation_candidates(&pool, 50)
        .await
        .unwrap();
    assert!(candidates.is_empty());
}
