//! Alert types and the escalation rules of the alert state machine.
//!
//! The durable state machine itself lives in the db crate (conditional
//! UPDATEs); the guards here are the pure half, shared by the evaluator,
//! the escalation sweeper, and tests.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Grace period an alert must remain unacknowledged before its first
/// escalation, and between subsequent escalations.
pub const ESCALATION_GRACE_MINUTES: i64 = 5;

/// Closed set of alert types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    EnergyAnomaly,
    PowerQuality,
    EquipmentFailure,
    ComplianceViolation,
    MaintenanceDue,
    EfficiencyDegradation,
    ThresholdExceeded,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::EnergyAnomaly => "energy_anomaly",
            AlertType::PowerQuality => "power_quality",
            AlertType::EquipmentFailure => "equipment_failure",
            AlertType::ComplianceViolation => "compliance_violation",
            AlertType::MaintenanceDue => "maintenance_due",
            AlertType::EfficiencyDegradation => "efficiency_degradation",
            AlertType::ThresholdExceeded => "threshold_exceeded",
        }
    }
}

/// Severity of a detected condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Maximum escalation level for this severity. Low and medium alerts
    /// are never escalated.
    pub fn escalation_ceiling(self) -> i16 {
        match self {
            Severity::Critical => 3,
            Severity::High => 2,
            Severity::Low | Severity::Medium => 0,
        }
    }
}

/// A threshold violation produced by the evaluator, not yet persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AlertCandidate {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub detected_value: Option<f64>,
    pub threshold_value: Option<f64>,
}

/// Why an alert is not eligible for escalation right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationSkip {
    /// Severity is low or medium; these are never escalated.
    SeverityTooLow,
    /// The alert has been acknowledged.
    Acknowledged,
    /// Already at the severity-dependent ceiling.
    AtCeiling,
    /// The grace window since creation (or since the last escalation)
    /// has not yet elapsed.
    InsideGraceWindow,
}

/// Decide whether an alert may be escalated at `now`.
///
/// An alert is eligible when its severity escalates at all, it is
/// unacknowledged, it is below its ceiling, and at least
/// [`ESCALATION_GRACE_MINUTES`] have passed since `created_at` (level 0)
/// or since `escalated_at` (level > 0).
pub fn escalation_eligibility(
    severity: Severity,
    escalation_level: i16,
    created_at: Timestamp,
    escalated_at: Option<Timestamp>,
    acknowledged_at: Option<Timestamp>,
    now: Timestamp,
) -> Result<(), EscalationSkip> {
    let ceiling = severity.escalation_ceiling();
    if ceiling == 0 {
        return Err(EscalationSkip::SeverityTooLow);
    }
    if acknowledged_at.is_some() {
        return Err(EscalationSkip::Acknowledged);
    }
    if escalation_level >= ceiling {
        return Err(EscalationSkip::AtCeiling);
    }

    let reference = if escalation_level == 0 {
        created_at
    } else {
        // A previously escalated alert waits a full grace window again.
        escalated_at.unwrap_or(created_at)
    };

    if now.signed_duration_since(reference) < Duration::minutes(ESCALATION_GRACE_MINUTES) {
        return Err(EscalationSkip::InsideGraceWindow);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn minutes_ago(m: i64) -> Timestamp {
        Utc::now() - Duration::minutes(m)
    }

    #[test]
    fn ceilings_match_severity() {
        assert_eq!(Severity::Critical.escalation_ceiling(), 3);
        assert_eq!(Severity::High.escalation_ceiling(), 2);
        assert_eq!(Severity::Medium.escalation_ceiling(), 0);
        assert_eq!(Severity::Low.escalation_ceiling(), 0);
    }

    #[test]
    fn critical_alert_past_grace_is_eligible() {
        let result = escalation_eligibility(
            Severity::Critical,
            0,
            minutes_ago(6),
            None,
            None,
            Utc::now(),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn fresh_alert_is_inside_grace_window() {
        let result = escalation_eligibility(
            Severity::Critical,
            0,
            minutes_ago(2),
            None,
            None,
            Utc::now(),
        );
        assert_eq!(result, Err(EscalationSkip::InsideGraceWindow));
    }

    #[test]
    fn medium_severity_never_escalates() {
        let result = escalation_eligibility(
            Severity::Medium,
            0,
            minutes_ago(60),
            None,
            None,
            Utc::now(),
        );
        assert_eq!(result, Err(EscalationSkip::SeverityTooLow));
    }

    #[test]
    fn acknowledged_alert_is_skipped() {
        let result = escalation_eligibility(
            Severity::High,
            0,
            minutes_ago(10),
            None,
            Some(minutes_ago(1)),
            Utc::now(),
        );
        assert_eq!(result, Err(EscalationSkip::Acknowledged));
    }

    #[test]
    fn ceiling_stops_further_escalation() {
        let result = escalation_eligibility(
            Severity::High,
            2,
            minutes_ago(60),
            Some(minutes_ago(30)),
            None,
            Utc::now(),
        );
        assert_eq!(result, Err(EscalationSkip::AtCeiling));

        let result = escalation_eligibility(
            Severity::Critical,
            3,
            minutes_ago(60),
            Some(minutes_ago(30)),
            None,
            Utc::now(),
        );
        assert_eq!(result, Err(EscalationSkip::AtCeiling));
    }

    #[test]
    fn re_escalation_waits_for_another_grace_window() {
        // Escalated 2 minutes ago: not yet eligible again.
        let result = escalation_eligibility(
            Severity::Critical,
            1,
            minutes_ago(20),
            Some(minutes_ago(2)),
            None,
            Utc::now(),
        );
        assert_eq!(result, Err(EscalationSkip::InsideGraceWindow));

        // Escalated 6 minutes ago: eligible for level 2.
        let result = escalation_eligibility(
            Severity::Critical,
            1,
            minutes_ago(20),
            Some(minutes_ago(6)),
            None,
            Utc::now(),
        );
        assert_eq!(result, Ok(()));
    }
}
