//! Background job types and their typed parameter payloads.
//!
//! Each `job_type` carries a tagged parameter variant that is validated at
//! creation time, so handlers never hit runtime type errors digging through
//! an untyped map.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Closed set of background job types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    AnalyticsProcessing,
    MaintenancePrediction,
    ComplianceCheck,
    AnomalyDetection,
    EfficiencyAnalysis,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::AnalyticsProcessing => "analytics_processing",
            JobType::MaintenancePrediction => "maintenance_prediction",
            JobType::ComplianceCheck => "compliance_check",
            JobType::AnomalyDetection => "anomaly_detection",
            JobType::EfficiencyAnalysis => "efficiency_analysis",
        }
    }

    /// Parse a wire string into a job type, rejecting anything outside the
    /// closed enum.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "analytics_processing" => Ok(JobType::AnalyticsProcessing),
            "maintenance_prediction" => Ok(JobType::MaintenancePrediction),
            "compliance_check" => Ok(JobType::ComplianceCheck),
            "anomaly_detection" => Ok(JobType::AnomalyDetection),
            "efficiency_analysis" => Ok(JobType::EfficiencyAnalysis),
            other => Err(CoreError::Validation(format!(
                "Unknown job_type: {other}"
            ))),
        }
    }
}

/// Typed parameters for each job type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobParameters {
    AnalyticsProcessing {
        building_id: DbId,
        /// Trailing window of readings to process, in hours.
        window_hours: i64,
    },
    MaintenancePrediction {
        equipment_id: DbId,
    },
    ComplianceCheck {
        building_id: DbId,
    },
    AnomalyDetection {
        building_id: DbId,
        /// How far back to look for baseline readings, in hours.
        lookback_hours: i64,
    },
    EfficiencyAnalysis {
        building_id: DbId,
        period_days: i64,
    },
}

impl JobParameters {
    /// The job type this payload belongs to.
    pub fn job_type(&self) -> JobType {
        match self {
            JobParameters::AnalyticsProcessing { .. } => JobType::AnalyticsProcessing,
            JobParameters::MaintenancePrediction { .. } => JobType::MaintenancePrediction,
            JobParameters::ComplianceCheck { .. } => JobType::ComplianceCheck,
            JobParameters::AnomalyDetection { .. } => JobType::AnomalyDetection,
            JobParameters::EfficiencyAnalysis { .. } => JobType::EfficiencyAnalysis,
        }
    }

    /// Parse and validate a raw parameters payload for the given job type.
    pub fn from_payload(
        job_type: JobType,
        payload: &serde_json::Value,
    ) -> Result<Self, CoreError> {
        let wrapped = serde_json::json!({ variant_name(job_type): payload });
        let params: JobParameters = serde_json::from_value(wrapped).map_err(|e| {
            CoreError::Validation(format!(
                "Invalid parameters for {}: {e}",
                job_type.as_str()
            ))
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Range checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            JobParameters::AnalyticsProcessing { window_hours, .. } => {
                positive(*window_hours, "window_hours")
            }
            JobParameters::AnomalyDetection { lookback_hours, .. } => {
                positive(*lookback_hours, "lookback_hours")
            }
            JobParameters::EfficiencyAnalysis { period_days, .. } => {
                positive(*period_days, "period_days")
            }
            JobParameters::MaintenancePrediction { .. }
            | JobParameters::ComplianceCheck { .. } => Ok(()),
        }
    }

    /// The building this job targets, if any.
    pub fn building_id(&self) -> Option<DbId> {
        match self {
            JobParameters::AnalyticsProcessing { building_id, .. }
            | JobParameters::ComplianceCheck { building_id }
            | JobParameters::AnomalyDetection { building_id, .. }
            | JobParameters::EfficiencyAnalysis { building_id, .. } => Some(*building_id),
            JobParameters::MaintenancePrediction { .. } => None,
        }
    }

    /// The equipment this job targets, if any.
    pub fn equipment_id(&self) -> Option<DbId> {
        match self {
            JobParameters::MaintenancePrediction { equipment_id } => Some(*equipment_id),
            _ => None,
        }
    }
}

fn variant_name(job_type: JobType) -> &'static str {
    // Serde's external tag uses the job_type wire name directly.
    job_type.as_str()
}

fn positive(value: i64, name: &str) -> Result<(), CoreError> {
    if value <= 0 {
        return Err(CoreError::Validation(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unknown_job_type_is_rejected() {
        assert_matches!(
            JobType::parse("report_generation"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn round_trips_wire_names() {
        for (s, t) in [
            ("analytics_processing", JobType::AnalyticsProcessing),
            ("maintenance_prediction", JobType::MaintenancePrediction),
            ("compliance_check", JobType::ComplianceCheck),
            ("anomaly_detection", JobType::AnomalyDetection),
            ("efficiency_analysis", JobType::EfficiencyAnalysis),
        ] {
            assert_eq!(JobType::parse(s).unwrap(), t);
            assert_eq!(t.as_str(), s);
        }
    }

    #[test]
    fn payload_parses_against_its_job_type() {
        let payload = serde_json::json!({ "building_id": 5, "lookback_hours": 24 });
        let params = JobParameters::from_payload(JobType::AnomalyDetection, &payload).unwrap();

        assert_eq!(params.job_type(), JobType::AnomalyDetection);
        assert_eq!(params.building_id(), Some(5));
        assert_eq!(params.equipment_id(), None);
    }

    #[test]
    fn payload_with_wrong_shape_is_a_validation_error() {
        // Anomaly detection requires lookback_hours.
        let payload = serde_json::json!({ "building_id": 5 });
        assert_matches!(
            JobParameters::from_payload(JobType::AnomalyDetection, &payload),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn non_positive_window_is_rejected() {
        let payload = serde_json::json!({ "building_id": 5, "lookback_hours": 0 });
        assert_matches!(
            JobParameters::from_payload(JobType::AnomalyDetection, &payload),
            Err(CoreError::Validation(_))
        );
    }
}
