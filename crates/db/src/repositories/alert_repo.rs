//! Repository for the `alerts` table and its lifecycle transitions.
//!
//! Every transition is a single conditional UPDATE so each state check and
//! write is one logical operation. A transition that matches zero rows is
//! reported as `None`; the caller distinguishes "missing" from "wrong
//! state" by a follow-up lookup.

use sqlx::PgPool;

use gridmon_core::alert::ESCALATION_GRACE_MINUTES;
use gridmon_core::types::DbId;

use crate::models::alert::{Alert, AlertListQuery, CreateAlert, UpdateAlert};
use crate::models::status::AlertStatus;

/// Column list for `alerts` queries.
const COLUMNS: &str = "\
    id, alert_type, severity, status_id, \
    building_id, equipment_id, audit_id, reading_id, \
    title, message, detected_value, threshold_value, \
    escalation_level, metadata, \
    acknowledged_by, acknowledged_at, resolved_by, resolved_at, escalated_at, \
    created_at, updated_at";

/// Maximum page size for alert listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for alert listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides persistence for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Insert a new alert in `active` state at escalation level 0.
    pub async fn create(pool: &PgPool, input: &CreateAlert) -> Result<Alert, sqlx::Error> {
        let query = format!(
            "INSERT INTO alerts \
                 (alert_type, severity, status_id, building_id, equipment_id, \
                  audit_id, reading_id, title, message, \
                  detected_value, threshold_value, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(input.alert_type.as_str())
            .bind(input.severity.as_str())
            .bind(AlertStatus::Active.id())
            .bind(input.building_id)
            .bind(input.equipment_id)
            .bind(input.audit_id)
            .bind(input.reading_id)
            .bind(&input.title)
            .bind(&input.message)
            .bind(input.detected_value)
            .bind(input.threshold_value)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// Find an alert by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alerts WHERE id = $1");
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List alerts with optional filters, newest first.
    pub async fn list(pool: &PgPool, params: &AlertListQuery) -> Result<Vec<Alert>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);
        let status_id = params
            .status
            .as_deref()
            .and_then(AlertStatus::parse)
            .map(AlertStatus::id);

        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if params.building_id.is_some() {
            conditions.push(format!("building_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.equipment_id.is_some() {
            conditions.push(format!("equipment_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.alert_type.is_some() {
            conditions.push(format!("alert_type = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.severity.is_some() {
            conditions.push(format!("severity = ${bind_idx}"));
            bind_idx += 1;
        }
        if status_id.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.from.is_some() {
            conditions.push(format!("created_at >= ${bind_idx}"));
            bind_idx += 1;
        }
        if params.to.is_some() {
            conditions.push(format!("created_at <= ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, Alert>(&query);
        if let Some(v) = params.building_id {
            q = q.bind(v);
        }
        if let Some(v) = params.equipment_id {
            q = q.bind(v);
        }
        if let Some(v) = &params.alert_type {
            q = q.bind(v);
        }
        if let Some(v) = &params.severity {
            q = q.bind(v);
        }
        if let Some(v) = status_id {
            q = q.bind(v);
        }
        if let Some(v) = params.from {
            q = q.bind(v);
        }
        if let Some(v) = params.to {
            q = q.bind(v);
        }
        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// Patch allow-listed fields. Metadata, when given, is merged over the
    /// existing map rather than replacing it.
    pub async fn update_fields(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAlert,
    ) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!(
            "UPDATE alerts SET \
                title = COALESCE($2, title), \
                message = COALESCE($3, message), \
                severity = COALESCE($4, severity), \
                metadata = metadata || COALESCE($5, '{{}}'::jsonb), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.message)
            .bind(input.severity.map(|s| s.as_str()))
            .bind(&input.metadata)
            .fetch_optional(pool)
            .await
    }

    /// Acknowledge an alert. Legal only from `active` or `escalated`, and
    /// only once; returns `None` if the alert is missing or in a state
    /// that does not permit acknowledgement.
    pub async fn acknowledge(
        pool: &PgPool,
        id: DbId,
        acknowledged_by: &str,
    ) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!(
            "UPDATE alerts SET \
                status_id = $2, \
                acknowledged_by = $3, \
                acknowledged_at = NOW(), \
                updated_at = NOW() \
             WHERE id = $1 \
               AND status_id IN ($4, $5) \
               AND acknowledged_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .bind(AlertStatus::Acknowledged.id())
            .bind(acknowledged_by)
            .bind(AlertStatus::Active.id())
            .bind(AlertStatus::Escalated.id())
            .fetch_optional(pool)
            .await
    }

    /// Resolve an alert from any non-resolved state. An optional note is
    /// merged into metadata under `resolution_notes` without discarding
    /// prior keys.
    pub async fn resolve(
        pool: &PgPool,
        id: DbId,
        resolved_by: &str,
        note: Option<&str>,
    ) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!(
            "UPDATE alerts SET \
                status_id = $2, \
                resolved_by = $3, \
                resolved_at = NOW(), \
                metadata = CASE \
                    WHEN $4::text IS NULL THEN metadata \
                    ELSE metadata || jsonb_build_object('resolution_notes', $4::text) \
                END, \
                updated_at = NOW() \
             WHERE id = $1 AND status_id <> $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .bind(AlertStatus::Resolved.id())
            .bind(resolved_by)
            .bind(note)
            .fetch_optional(pool)
            .await
    }

    /// Escalate one level with a compare-and-swap on the current
    /// escalation level, so a concurrent acknowledge or a second sweeper
    /// pass cannot double-escalate.
    pub async fn escalate(
        pool: &PgPool,
        id: DbId,
        expected_level: i16,
        ceiling: i16,
    ) -> Result<Option<Alert>, sqlx::Error> {
        let query = format!(
            "UPDATE alerts SET \
                escalation_level = escalation_level + 1, \
                status_id = $2, \
                escalated_at = NOW(), \
                updated_at = NOW() \
             WHERE id = $1 \
               AND status_id IN ($3, $2) \
               AND acknowledged_at IS NULL \
               AND escalation_level = $4 \
               AND escalation_level < $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(id)
            .bind(AlertStatus::Escalated.id())
            .bind(AlertStatus::Active.id())
            .bind(expected_level)
            .bind(ceiling)
            .fetch_optional(pool)
            .await
    }

    /// Select alerts due for escalation: unacknowledged high/critical
    /// alerts below their ceiling whose grace window (since creation for
    /// level 0, since the last escalation otherwise) has elapsed.
    /// Critical before high, then oldest first, capped at `batch`.
    pub async fn list_escalation_candidates(
        pool: &PgPool,
        batch: i64,
    ) -> Result<Vec<Alert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE status_id IN ($1, $2) \
               AND acknowledged_at IS NULL \
               AND severity IN ('high', 'critical') \
               AND escalation_level < CASE severity \
                   WHEN 'critical' THEN 3 ELSE 2 END \
               AND CASE \
                   WHEN escalation_level = 0 \
                       THEN created_at <= NOW() - make_interval(mins => $3) \
                   ELSE escalated_at <= NOW() - make_interval(mins => $3) \
                   END \
             ORDER BY CASE severity WHEN 'critical' THEN 0 ELSE 1 END, \
                      created_at ASC \
             LIMIT $4"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(AlertStatus::Active.id())
            .bind(AlertStatus::Escalated.id())
            .bind(ESCALATION_GRACE_MINUTES as i32)
            .bind(batch)
            .fetch_all(pool)
            .await
    }
}
