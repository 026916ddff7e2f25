//! Stored sensor readings.
//!
//! Reading CRUD belongs to an upstream service; this model exists so the
//! monitoring trigger can persist the row it was handed and run its
//! trailing-window data-sufficiency check.

use serde::Serialize;
use sqlx::FromRow;

use gridmon_core::types::{DbId, Timestamp};

/// A row from the `readings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReadingRow {
    pub id: DbId,
    pub building_id: DbId,
    pub equipment_id: Option<DbId>,
    /// "energy", "power_quality" or "equipment".
    pub kind: String,
    /// The variant-specific measurement payload as received.
    pub payload: serde_json::Value,
    pub recorded_at: Timestamp,
    pub created_at: Timestamp,
}
