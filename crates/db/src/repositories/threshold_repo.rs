//! Repository for the `alert_thresholds` table.

use sqlx::PgPool;

use gridmon_core::types::DbId;

use crate::models::threshold::{AlertThreshold, CreateThreshold, ThresholdListQuery};

/// Column list for `alert_thresholds` queries.
const COLUMNS: &str = "\
    id, building_id, equipment_id, parameter_type, threshold_type, \
    min_value, max_value, severity, enabled, \
    escalation_interval_minutes, notify_recipients, \
    created_at, updated_at";

/// Default escalation interval when the operator does not set one.
const DEFAULT_ESCALATION_INTERVAL_MINUTES: i32 = 5;

/// Provides persistence for operator-configured thresholds.
pub struct ThresholdRepo;

impl ThresholdRepo {
    /// List thresholds with optional filters.
    pub async fn list(
        pool: &PgPool,
        params: &ThresholdListQuery,
    ) -> Result<Vec<AlertThreshold>, sqlx::Error> {
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
        if params.parameter_type.is_some() {
            conditions.push(format!("parameter_type = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.enabled.is_some() {
            conditions.push(format!("enabled = ${bind_idx}"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM alert_thresholds \
             {where_clause} \
             ORDER BY parameter_type, building_id NULLS FIRST, equipment_id NULLS FIRST"
        );

        let mut q = sqlx::query_as::<_, AlertThreshold>(&query);
        if let Some(v) = params.building_id {
            q = q.bind(v);
        }
        if let Some(v) = params.equipment_id {
            q = q.bind(v);
        }
        if let Some(v) = &params.parameter_type {
            q = q.bind(v);
        }
        if let Some(v) = params.enabled {
            q = q.bind(v);
        }

        q.fetch_all(pool).await
    }

    /// True if an enabled threshold already exists for the same
    /// (parameter_type, building, equipment) combination.
    ///
    /// The partial unique index `uq_alert_thresholds_scope` backs this as a
    /// race-safe last line of defence; this check exists to return a clean
    /// conflict before attempting the insert.
    pub async fn duplicate_exists(
        pool: &PgPool,
        parameter_type: &str,
        building_id: Option<DbId>,
        equipment_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                SELECT 1 FROM alert_thresholds \
                WHERE enabled \
                  AND parameter_type = $1 \
                  AND building_id IS NOT DISTINCT FROM $2 \
                  AND equipment_id IS NOT DISTINCT FROM $3 \
             )",
        )
        .bind(parameter_type)
        .bind(building_id)
        .bind(equipment_id)
        .fetch_one(pool)
        .await
    }

    /// Insert a new threshold.
    pub async fn create(
        pool: &PgPool,
        input: &CreateThreshold,
    ) -> Result<AlertThreshold, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert_thresholds \
                 (building_id, equipment_id, parameter_type, threshold_type, \
                  min_value, max_value, severity, enabled, \
                  escalation_interval_minutes, notify_recipients) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertThreshold>(&query)
            .bind(input.building_id)
            .bind(input.equipment_id)
            .bind(input.parameter_type.as_str())
            .bind(&input.threshold_type)
            .bind(input.min_value)
            .bind(input.max_value)
            .bind(input.severity.as_str())
            .bind(input.enabled.unwrap_or(true))
            .bind(
                input
                    .escalation_interval_minutes
                    .unwrap_or(DEFAULT_ESCALATION_INTERVAL_MINUTES),
            )
            .bind(
                input
                    .notify_recipients
                    .clone()
                    .unwrap_or_else(|| serde_json::json!([])),
            )
            .fetch_one(pool)
            .await
    }

    /// Fetch the enabled thresholds applicable to a reading: rows for the
    /// exact building/equipment plus broad rows whose scope columns are
    /// NULL, restricted to the reading's parameter type.
    pub async fn get_enabled_for(
        pool: &PgPool,
        building_id: DbId,
        equipment_id: Option<DbId>,
        parameter_type: &str,
    ) -> Result<Vec<AlertThreshold>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alert_thresholds \
             WHERE enabled \
               AND parameter_type = $1 \
               AND (building_id = $2 OR building_id IS NULL) \
               AND (equipment_id IS NOT DISTINCT FROM $3 OR equipment_id IS NULL) \
             ORDER BY building_id NULLS LAST, equipment_id NULLS LAST"
        );
        sqlx::query_as::<_, AlertThreshold>(&query)
            .bind(parameter_type)
            .bind(building_id)
            .bind(equipment_id)
            .fetch_all(pool)
            .await
    }
}
