//! Repository for the `observations` table.

use somnus_core::telemetry::NewObservation;
use somnus_core::types::DbId;
use sqlx::PgPool;

use crate::models::observation::ObservationRow;

/// Column list for `observations` queries.
const COLUMNS: &str = "\
    id, patient_id, measurement, start_time, end_time, \
    sample_rate, data_points, created_at";

pub struct ObservationRepo;

impl ObservationRepo {
    /// Insert a transmission's observations in one transaction.
    pub async fn insert_batch(
        pool: &PgPool,
        observations: &[NewObservation],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for obs in observations {
            let result = sqlx::query(
                "INSERT INTO observations \
                    (patient_id, measurement, start_time, end_time, sample_rate, data_points) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(obs.patient_id)
            .bind(&obs.measurement)
            .bind(obs.start)
            .bind(obs.end)
            .bind(obs.sample_rate)
            .bind(&obs.data_points)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Every stored observation for a patient, oldest first.
    pub async fn list_for_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Vec<ObservationRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM observations WHERE patient_id = $1 \
             ORDER BY start_time, id"
        );
        sqlx::query_as::<_, ObservationRow>(&query)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }
}
