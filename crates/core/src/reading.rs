//! Sensor reading types consumed by the threshold evaluator.
//!
//! Readings are immutable once received. Fields that a given meter does not
//! report are `None`; evaluation rules that need a missing field simply skip
//! (no candidate, no error).

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Which family of parameters a reading (or threshold) applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Energy,
    PowerQuality,
    Equipment,
}

impl ParameterKind {
    /// Canonical database string for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterKind::Energy => "energy",
            ParameterKind::PowerQuality => "power_quality",
            ParameterKind::Equipment => "equipment",
        }
    }
}

/// Variant-specific measurement payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadingData {
    Energy {
        /// Energy consumed over the metering interval, in kWh.
        consumption_kwh: Option<f64>,
        /// Instantaneous demand, in kW.
        demand_kw: Option<f64>,
        /// Power factor in [0, 1].
        power_factor: Option<f64>,
    },
    PowerQuality {
        /// RMS voltage, in volts.
        voltage: Option<f64>,
        /// Total harmonic distortion of voltage, in percent.
        thd_voltage: Option<f64>,
        /// Line frequency, in Hz.
        frequency: Option<f64>,
    },
    Equipment {
        /// Reported operating state, e.g. "running", "idle", "faulty".
        status: Option<EquipmentStatus>,
        /// Operating temperature, in Celsius.
        temperature: Option<f64>,
        /// Accumulated runtime, in hours.
        runtime_hours: Option<f64>,
    },
}

impl ReadingData {
    /// The parameter family this payload belongs to.
    pub fn kind(&self) -> ParameterKind {
        match self {
            ReadingData::Energy { .. } => ParameterKind::Energy,
            ReadingData::PowerQuality { .. } => ParameterKind::PowerQuality,
            ReadingData::Equipment { .. } => ParameterKind::Equipment,
        }
    }
}

/// Reported equipment operating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Running,
    Idle,
    Maintenance,
    Faulty,
    Offline,
}

/// A single timestamped measurement for one building (and optionally one
/// piece of equipment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub building_id: DbId,
    pub equipment_id: Option<DbId>,
    pub recorded_at: Timestamp,
    #[serde(flatten)]
    pub data: ReadingData,
}
