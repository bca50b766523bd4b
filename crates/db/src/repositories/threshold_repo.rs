//! Repository for the `thresholds` table.

use somnus_core::types::DbId;
use sqlx::PgPool;

use crate::models::threshold::{ThresholdRow, UpdateThreshold};

/// Column list for `thresholds` queries.
const COLUMNS: &str = "\
    id, patient_id, measurement, lower_value, upper_value, \
    comments, unit, active";

pub struct ThresholdRepo;

impl ThresholdRepo {
    pub async fn list_for_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Vec<ThresholdRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM thresholds WHERE patient_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, ThresholdRow>(&query)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite one threshold. Returns `None` if the row does not exist.
    pub async fn update(
        pool: &PgPool,
        dto: &UpdateThreshold,
    ) -> Result<Option<ThresholdRow>, sqlx::Error> {
        let query = format!(
            "UPDATE thresholds SET \
                lower_value = $3, \
                upper_value = $4, \
                comments = $5, \
                active = $6, \
                updated_at = NOW() \
             WHERE patient_id = $1 AND measurement = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ThresholdRow>(&query)
            .bind(dto.patient_id)
            .bind(&dto.measurement)
            .bind(dto.lower_value)
            .bind(dto.upper_value)
            .bind(&dto.comments)
            .bind(dto.active)
            .fetch_optional(pool)
            .await
    }
}
