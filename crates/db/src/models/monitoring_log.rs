//! Append-only monitoring pass log. Used for audit and debugging, never
//! for control flow.

use serde::Serialize;
use sqlx::FromRow;

use gridmon_core::types::{DbId, Timestamp};

/// A row from the `system_monitoring_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MonitoringLog {
    pub id: DbId,
    pub building_id: Option<DbId>,
    /// "ok" or "error".
    pub result: String,
    pub details: serde_json::Value,
    pub alert_count: i32,
    pub duration_ms: i64,
    pub created_at: Timestamp,
}

/// Insert DTO for one monitoring pass.
#[derive(Debug, Clone)]
pub struct CreateMonitoringLog {
    pub building_id: Option<DbId>,
    pub result: String,
    pub details: serde_json::Value,
    pub alert_count: i32,
    pub duration_ms: i64,
}
