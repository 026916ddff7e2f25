//! Repository for the append-only `system_monitoring_logs` table.

use sqlx::PgPool;

use crate::models::monitoring_log::{CreateMonitoringLog, MonitoringLog};

/// Column list for `system_monitoring_logs` queries.
const COLUMNS: &str = "\
    id, building_id, result, details, alert_count, duration_ms, created_at";

/// Provides persistence for monitoring pass logs.
pub struct MonitoringLogRepo;

impl MonitoringLogRepo {
    /// Append one monitoring pass record.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateMonitoringLog,
    ) -> Result<MonitoringLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO system_monitoring_logs \
                 (building_id, result, details, alert_count, duration_ms) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MonitoringLog>(&query)
            .bind(input.building_id)
            .bind(&input.result)
            .bind(&input.details)
            .bind(input.alert_count)
            .bind(input.duration_ms)
            .fetch_one(pool)
            .await
    }

    /// Most recent log rows, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<MonitoringLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM system_monitoring_logs \
             ORDER BY created_at DESC LIMIT $1"
        );
        sqlx::query_as::<_, MonitoringLog>(&query)
            .bind(limit.clamp(1, 200))
            .fetch_all(pool)
            .await
    }
}
