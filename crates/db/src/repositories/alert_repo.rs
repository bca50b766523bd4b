//! Repository for the `alerts` table.

use somnus_core::alert::NewAlert;
use somnus_core::roles::ROLE_ADMIN;
use somnus_core::types::DbId;
use sqlx::PgPool;

use crate::models::alert::AlertRow;

/// Column list for `alerts` queries.
const COLUMNS: &str = "\
    id, patient_id, clinician_id, alert_name, description, \
    alert_level, is_resolved, created_at, updated_at";

/// Provides query operations for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Insert a new, open alert.
    pub async fn create(pool: &PgPool, alert: &NewAlert) -> Result<AlertRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO alerts (patient_id, clinician_id, alert_name, description, alert_level) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(alert.patient_id)
            .bind(alert.clinician_id)
            .bind(&alert.alert_name)
            .bind(&alert.description)
            .bind(alert.alert_level.as_i16())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AlertRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alerts WHERE id = $1");
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count a patient's unresolved alerts at exactly `level`.
    pub async fn count_open(
        pool: &PgPool,
        patient_id: DbId,
        level: i16,
    ) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM alerts \
             WHERE patient_id = $1 AND alert_level = $2 AND NOT is_resolved",
        )
        .bind(patient_id)
        .bind(level)
        .fetch_one(pool)
        .await?;
        Ok(count.0)
    }

    /// Mark an alert resolved by `clinician_id` and drop its level to normal.
    ///
    /// Returns `None` if the alert does not exist.
    pub async fn resolve(
        pool: &PgPool,
        id: DbId,
        clinician_id: DbId,
    ) -> Result<Option<AlertRow>, sqlx::Error> {
        let query = format!(
            "UPDATE alerts SET \
                is_resolved = TRUE, \
                alert_level = 0, \
                clinician_id = $2, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(id)
            .bind(clinician_id)
            .fetch_optional(pool)
            .await
    }

    /// All alerts for a patient, newest first.
    pub async fn list_for_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts WHERE patient_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }

    /// Alerts for every patient the user shares a care group with, or for all
    /// patients when the user is an admin. Newest first.
    pub async fn list_visible_to(
        pool: &PgPool,
        auth_id: &str,
    ) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts a \
             WHERE EXISTS (\
                SELECT 1 FROM users u \
                WHERE u.auth_id = $1 AND (\
                    u.role = $2 OR EXISTS (\
                        SELECT 1 FROM user_care_group_relations r \
                        JOIN patients p ON p.care_group_id = r.care_group_id \
                        WHERE r.user_id = u.id AND p.id = a.patient_id\
                    )\
                )\
             ) \
             ORDER BY a.created_at DESC, a.id DESC"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(auth_id)
            .bind(ROLE_ADMIN)
            .fetch_all(pool)
            .await
    }
}
