//! Repository for the aggregate alert level on `patients`.

use somnus_core::types::DbId;
use sqlx::PgPool;

pub struct PatientRepo;

impl PatientRepo {
    /// Returns `None` if the patient does not exist.
    pub async fn find_alert_level(pool: &PgPool, id: DbId) -> Result<Option<i16>, sqlx::Error> {
        let row: Option<(i16,)> = sqlx::query_as("SELECT alert_level FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Returns `true` if a row was updated.
    pub async fn update_alert_level(
        pool: &PgPool,
        id: DbId,
        level: i16,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE patients SET alert_level = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(level)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
