//! Repository for the `devices` table.

use somnus_core::store::DeviceTelemetryUpdate;
use somnus_core::telemetry::DeviceIdentity;
use somnus_core::types::DbId;
use sqlx::PgPool;

use crate::models::device::DeviceRow;

/// Column list for `devices` queries.
const COLUMNS: &str = "\
    cradle_id, mouthguard_id, device_pin, patient_id, \
    battery_level, battery_health, last_login, last_transmission";

/// Provides query operations for registered devices.
pub struct DeviceRepo;

impl DeviceRepo {
    pub async fn find(
        pool: &PgPool,
        identity: DeviceIdentity,
    ) -> Result<Option<DeviceRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM devices WHERE cradle_id = $1 AND mouthguard_id = $2"
        );
        sqlx::query_as::<_, DeviceRow>(&query)
            .bind(identity.cradle_id)
            .bind(identity.mouthguard_id)
            .fetch_optional(pool)
            .await
    }

    /// The device pair currently worn by a patient.
    pub async fn find_for_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Option<DeviceRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM devices WHERE patient_id = $1");
        sqlx::query_as::<_, DeviceRow>(&query)
            .bind(patient_id)
            .fetch_optional(pool)
            .await
    }

    /// Register a device pair to a patient with a fresh PIN and a full battery.
    ///
    /// Fails with a unique violation if the pair is already registered or the
    /// patient already wears a device.
    pub async fn provision(
        pool: &PgPool,
        identity: DeviceIdentity,
        patient_id: DbId,
        device_pin: i32,
    ) -> Result<DeviceRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO devices (cradle_id, mouthguard_id, device_pin, patient_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceRow>(&query)
            .bind(identity.cradle_id)
            .bind(identity.mouthguard_id)
            .bind(device_pin)
            .bind(patient_id)
            .fetch_one(pool)
            .await
    }

    /// Remove the patient's device registration. Returns `true` if one existed.
    pub async fn deprovision(pool: &PgPool, patient_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE patient_id = $1")
            .bind(patient_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp a successful login.
    pub async fn record_login(pool: &PgPool, identity: DeviceIdentity) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE devices SET last_login = NOW() \
             WHERE cradle_id = $1 AND mouthguard_id = $2",
        )
        .bind(identity.cradle_id)
        .bind(identity.mouthguard_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record battery state and upload time. Returns `true` if a row was updated.
    pub async fn update_telemetry(
        pool: &PgPool,
        identity: DeviceIdentity,
        update: &DeviceTelemetryUpdate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE devices SET \
                battery_level = $3, \
                battery_health = $4, \
                last_transmission = $5 \
             WHERE cradle_id = $1 AND mouthguard_id = $2",
        )
        .bind(identity.cradle_id)
        .bind(identity.mouthguard_id)
        .bind(update.battery_level)
        .bind(update.battery_health)
        .bind(update.last_transmission)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
