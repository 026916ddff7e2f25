//! Threshold entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gridmon_core::alert::Severity;
use gridmon_core::evaluator::ThresholdSpec;
use gridmon_core::reading::ParameterKind;
use gridmon_core::types::{DbId, Timestamp};

/// A row from the `alert_thresholds` table.
///
/// `building_id`/`equipment_id` of NULL mean the threshold applies to all
/// buildings/equipment for its parameter type.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertThreshold {
    pub id: DbId,
    pub building_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
    pub parameter_type: String,
    pub threshold_type: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub severity: String,
    pub enabled: bool,
    pub escalation_interval_minutes: i32,
    pub notify_recipients: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AlertThreshold {
    /// Convert to the evaluator's pure spec form.
    pub fn to_spec(&self) -> ThresholdSpec {
        let parameter_kind = match self.parameter_type.as_str() {
            "power_quality" => ParameterKind::PowerQuality,
            "equipment" => ParameterKind::Equipment,
            _ => ParameterKind::Energy,
        };
        let severity = match self.severity.as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        };
        ThresholdSpec {
            parameter_kind,
            min_value: self.min_value,
            max_value: self.max_value,
            severity,
        }
    }
}

/// Insert DTO for `POST /thresholds`.
#[derive(Debug, Deserialize)]
pub struct CreateThreshold {
    pub building_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
    pub parameter_type: ParameterKind,
    /// One of "absolute", "percentage", "deviation".
    pub threshold_type: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub severity: Severity,
    /// Defaults to enabled.
    pub enabled: Option<bool>,
    /// Minutes between escalations for alerts raised by this threshold.
    pub escalation_interval_minutes: Option<i32>,
    /// Recipient identifiers for notifications (opaque to this service).
    pub notify_recipients: Option<serde_json::Value>,
}

/// Query parameters for `GET /thresholds`.
#[derive(Debug, Default, Deserialize)]
pub struct ThresholdListQuery {
    pub building_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
    pub parameter_type: Option<String>,
    pub enabled: Option<bool>,
}
