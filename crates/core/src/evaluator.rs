//! Threshold evaluation engine for incoming readings.
//!
//! Pure logic, no database access. The caller fetches the enabled
//! thresholds applicable to the reading's building/equipment and passes
//! them in alongside the reading.
//!
//! Two rule sources contribute candidates, in order:
//! 1. Built-in power-quality / energy / equipment rules.
//! 2. Operator-configured [`ThresholdSpec`] rows.
//!
//! A rule whose input field is absent from the reading is skipped silently.

use crate::alert::{AlertCandidate, AlertType, Severity};
use crate::reading::{EquipmentStatus, ParameterKind, Reading, ReadingData};

/// Power factor below this is a medium-severity violation.
const POWER_FACTOR_WARN: f64 = 0.85;
/// Power factor below this is critical.
const POWER_FACTOR_CRITICAL: f64 = 0.80;
/// Consumption above this (kWh per interval) is flagged as an anomaly.
const CONSUMPTION_ANOMALY_KWH: f64 = 1000.0;
/// Voltage THD above this (percent) is high severity.
const THD_VOLTAGE_HIGH: f64 = 8.0;
/// Voltage THD above this (percent) is critical.
const THD_VOLTAGE_CRITICAL: f64 = 12.0;
/// Acceptable RMS voltage band (230 V nominal, +/- 10%).
const VOLTAGE_MIN: f64 = 207.0;
const VOLTAGE_MAX: f64 = 253.0;
/// Deviation beyond the band (volts) at which a voltage excursion is
/// critical rather than high.
const VOLTAGE_CRITICAL_DEVIATION: f64 = 10.0;

/// An operator-configured threshold, already filtered to enabled rows
/// applicable to the reading's building/equipment.
#[derive(Debug, Clone)]
pub struct ThresholdSpec {
    pub parameter_kind: ParameterKind,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub severity: Severity,
}

/// Evaluate a reading against built-in rules and configured thresholds.
///
/// Returns candidates in rule order; the caller persists them as alerts.
pub fn evaluate(reading: &Reading, thresholds: &[ThresholdSpec]) -> Vec<AlertCandidate> {
    let mut candidates = Vec::new();

    match &reading.data {
        ReadingData::Energy {
            consumption_kwh,
            power_factor,
            ..
        } => {
            if let Some(pf) = power_factor {
                check_power_factor(*pf, &mut candidates);
            }
            if let Some(kwh) = consumption_kwh {
                if *kwh > CONSUMPTION_ANOMALY_KWH {
                    candidates.push(AlertCandidate {
                        alert_type: AlertType::EnergyAnomaly,
                        severity: Severity::Medium,
                        title: "Abnormal energy consumption".to_string(),
                        message: format!(
                            "Consumption of {kwh:.1} kWh exceeds the {CONSUMPTION_ANOMALY_KWH:.0} kWh anomaly threshold"
                        ),
                        detected_value: Some(*kwh),
                        threshold_value: Some(CONSUMPTION_ANOMALY_KWH),
                    });
                }
            }
        }
        ReadingData::PowerQuality {
            voltage,
            thd_voltage,
            ..
        } => {
            if let Some(thd) = thd_voltage {
                check_thd(*thd, &mut candidates);
            }
            if let Some(v) = voltage {
                check_voltage(*v, &mut candidates);
            }
        }
        ReadingData::Equipment { status, .. } => {
            if let Some(EquipmentStatus::Faulty) = status {
                candidates.push(AlertCandidate {
                    alert_type: AlertType::EquipmentFailure,
                    severity: Severity::Critical,
                    title: "Equipment reported faulty".to_string(),
                    message: "Equipment status reading is 'faulty'".to_string(),
                    detected_value: None,
                    threshold_value: None,
                });
            }
        }
    }

    for spec in thresholds {
        if spec.parameter_kind != reading.data.kind() {
            continue;
        }
        check_configured(reading, spec, &mut candidates);
    }

    candidates
}

/// Power factor rule: strict `<` on both bounds, one candidate at most.
/// The reported threshold is always the outer (0.85) bound.
fn check_power_factor(pf: f64, out: &mut Vec<AlertCandidate>) {
    let severity = if pf < POWER_FACTOR_CRITICAL {
        Severity::Critical
    } else if pf < POWER_FACTOR_WARN {
        Severity::Medium
    } else {
        return;
    };

    out.push(AlertCandidate {
        alert_type: AlertType::ThresholdExceeded,
        severity,
        title: "Low power factor".to_string(),
        message: format!("Power factor {pf:.2} is below the {POWER_FACTOR_WARN:.2} minimum"),
        detected_value: Some(pf),
        threshold_value: Some(POWER_FACTOR_WARN),
    });
}

/// THD rule: strict `>` on both bounds, one candidate at most.
fn check_thd(thd: f64, out: &mut Vec<AlertCandidate>) {
    let (severity, threshold) = if thd > THD_VOLTAGE_CRITICAL {
        (Severity::Critical, THD_VOLTAGE_CRITICAL)
    } else if thd > THD_VOLTAGE_HIGH {
        (Severity::High, THD_VOLTAGE_HIGH)
    } else {
        return;
    };

    out.push(AlertCandidate {
        alert_type: AlertType::PowerQuality,
        severity,
        title: "Voltage THD out of range".to_string(),
        message: format!("Voltage THD {thd:.1}% exceeds {threshold:.0}%"),
        detected_value: Some(thd),
        threshold_value: Some(threshold),
    });
}

/// Voltage band rule: outside [207, 253] V; severity scales with how far
/// past the violated bound the reading is.
fn check_voltage(v: f64, out: &mut Vec<AlertCandidate>) {
    let (bound, deviation) = if v < VOLTAGE_MIN {
        (VOLTAGE_MIN, VOLTAGE_MIN - v)
    } else if v > VOLTAGE_MAX {
        (VOLTAGE_MAX, v - VOLTAGE_MAX)
    } else {
        return;
    };

    let severity = if deviation > VOLTAGE_CRITICAL_DEVIATION {
        Severity::Critical
    } else {
        Severity::High
    };

    out.push(AlertCandidate {
        alert_type: AlertType::PowerQuality,
        severity,
        title: "Voltage out of range".to_string(),
        message: format!("Voltage {v:.1} V is outside [{VOLTAGE_MIN:.0}, {VOLTAGE_MAX:.0}] V"),
        detected_value: Some(v),
        threshold_value: Some(bound),
    });
}

/// Compare a configured threshold against the primary metric of the
/// reading's variant: consumption for energy, voltage for power quality,
/// temperature for equipment. Absent fields skip the rule.
fn check_configured(reading: &Reading, spec: &ThresholdSpec, out: &mut Vec<AlertCandidate>) {
    let value = match &reading.data {
        ReadingData::Energy {
            consumption_kwh, ..
        } => *consumption_kwh,
        ReadingData::PowerQuality { voltage, .. } => *voltage,
        ReadingData::Equipment { temperature, .. } => *temperature,
    };

    let Some(value) = value else {
        return;
    };

    let violated = match (spec.min_value, spec.max_value) {
        (Some(min), _) if value < min => Some(min),
        (_, Some(max)) if value > max => Some(max),
        _ => None,
    };

    if let Some(bound) = violated {
        out.push(AlertCandidate {
            alert_type: AlertType::ThresholdExceeded,
            severity: spec.severity,
            title: format!("Configured {} threshold exceeded", spec.parameter_kind.as_str()),
            message: format!(
                "Value {value:.2} violates the configured bound {bound:.2} for {}",
                spec.parameter_kind.as_str()
            ),
            detected_value: Some(value),
            threshold_value: Some(bound),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
