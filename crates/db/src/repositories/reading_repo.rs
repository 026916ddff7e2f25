//! Repository for stored readings.
//!
//! The monitoring trigger persists each reading it is handed and uses the
//! trailing-window count as a data-sufficiency gate before scheduling the
//! first expensive analysis for a building.

use sqlx::PgPool;

use gridmon_core::reading::Reading;
use gridmon_core::types::{DbId, Timestamp};

use crate::models::reading::ReadingRow;

/// Column list for `readings` queries.
const COLUMNS: &str = "\
    id, building_id, equipment_id, kind, payload, recorded_at, created_at";

/// Provides persistence for sensor readings.
pub struct ReadingRepo;

impl ReadingRepo {
    /// Store one reading. The variant payload is kept as received.
    pub async fn insert(pool: &PgPool, reading: &Reading) -> Result<ReadingRow, sqlx::Error> {
        let payload =
            serde_json::to_value(&reading.data).unwrap_or(serde_json::Value::Null);
        let query = format!(
            "INSERT INTO readings (building_id, equipment_id, kind, payload, recorded_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReadingRow>(&query)
            .bind(reading.building_id)
            .bind(reading.equipment_id)
            .bind(reading.data.kind().as_str())
            .bind(&payload)
            .bind(reading.recorded_at)
            .fetch_one(pool)
            .await
    }

    /// Count readings of a kind for a building recorded at or after `since`.
    pub async fn count_since(
        pool: &PgPool,
        building_id: DbId,
        kind: &str,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM readings \
             WHERE building_id = $1 AND kind = $2 AND recorded_at >= $3",
        )
        .bind(building_id)
        .bind(kind)
        .bind(since)
        .fetch_one(pool)
        .await
    }
}
