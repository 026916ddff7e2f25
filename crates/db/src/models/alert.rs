//! Alert entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gridmon_core::alert::{AlertType, Severity};
use gridmon_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `alerts` table. Never physically deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alert {
    pub id: DbId,
    pub alert_type: String,
    pub severity: String,
    pub status_id: StatusId,
    pub building_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
    pub audit_id: Option<DbId>,
    pub reading_id: Option<DbId>,
    pub title: String,
    pub message: String,
    pub detected_value: Option<f64>,
    pub threshold_value: Option<f64>,
    pub escalation_level: i16,
    pub metadata: serde_json::Value,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<Timestamp>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<Timestamp>,
    pub escalated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Alert {
    /// Severity parsed back from its stored string. Rows are only written
    /// through the typed DTOs, so an unknown string indicates data
    /// tampering and maps to the lowest severity.
    pub fn severity_enum(&self) -> Severity {
        match self.severity.as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

/// Insert DTO for a new alert, whether evaluator-created or manual.
#[derive(Debug, Clone)]
pub struct CreateAlert {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub building_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
    pub audit_id: Option<DbId>,
    pub reading_id: Option<DbId>,
    pub title: String,
    pub message: String,
    pub detected_value: Option<f64>,
    pub threshold_value: Option<f64>,
    pub metadata: serde_json::Value,
}

/// Allow-listed patchable fields for `PATCH /alerts/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateAlert {
    pub title: Option<String>,
    pub message: Option<String>,
    pub severity: Option<Severity>,
    pub metadata: Option<serde_json::Value>,
}

/// Query parameters for `GET /alerts`.
#[derive(Debug, Default, Deserialize)]
pub struct AlertListQuery {
    pub building_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
    pub alert_type: Option<String>,
    pub severity: Option<String>,
    /// Status filter as a wire string ("active", "escalated", ...).
    pub status: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
