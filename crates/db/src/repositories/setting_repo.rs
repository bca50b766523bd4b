//! Repository for the `settings` table.

use somnus_core::types::DbId;
use sqlx::PgPool;

use crate::models::setting::{SettingRow, UpdateSetting};

/// Column list for `settings` queries.
const COLUMNS: &str = "\
    id, patient_id, setting_name, primary_value, secondary_value, \
    tertiary_value, unit, change_reason";

/// Provides query operations for patient settings.
pub struct SettingRepo;

impl SettingRepo {
    pub async fn find(
        pool: &PgPool,
        patient_id: DbId,
        setting_name: &str,
    ) -> Result<Option<SettingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM settings WHERE patient_id = $1 AND setting_name = $2"
        );
        sqlx::query_as::<_, SettingRow>(&query)
            .bind(patient_id)
            .bind(setting_name)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Vec<SettingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM settings WHERE patient_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, SettingRow>(&query)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }

    /// Update several of one patient's settings within a transaction.
    ///
    /// Returns `None` (and writes nothing) if any named setting does not exist.
    pub async fn update_batch(
        pool: &PgPool,
        patient_id: DbId,
        updates: &[UpdateSetting],
    ) -> Result<Option<Vec<SettingRow>>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::with_capacity(updates.len());

        let query = format!(
            "UPDATE settings SET \
                primary_value = $3, \
                secondary_value = $4, \
                tertiary_value = $5, \
                change_reason = $6, \
                updated_at = NOW() \
             WHERE patient_id = $1 AND setting_name = $2 \
             RETURNING {COLUMNS}"
        );

        for update in updates {
            let row = sqlx::query_as::<_, SettingRow>(&query)
                .bind(patient_id)
                .bind(&update.setting_name)
                .bind(update.primary_value)
                .bind(update.secondary_value)
                .bind(update.tertiary_value)
                .bind(&update.change_reason)
                .fetch_optional(&mut *tx)
                .await?;
            match row {
                Some(row) => results.push(row),
                None => return Ok(None),
            }
        }

        tx.commit().await?;
        Ok(Some(results))
    }
}
