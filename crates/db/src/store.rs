//! [`PgStore`]: the core store traits on top of the repositories.

use somnus_core::alert::{Alert, AlertLevel, NewAlert};
use somnus_core::error::CoreError;
use somnus_core::measurement::Setting;
use somnus_core::store::{
    AlertStore, CareDirectory, Device, DeviceStore, DeviceTelemetryUpdate, ObservationStore,
    PatientStore, SettingStore,
};
use somnus_core::telemetry::{DeviceIdentity, NewObservation};
use somnus_core::types::DbId;

use crate::repositories::{
    AlertRepo, CareGroupRepo, DeviceRepo, ObservationRepo, PatientRepo, SettingRepo,
};
use crate::DbPool;

/// Postgres-backed monitoring store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Database failures surface to the core as internal errors.
fn internal(e: sqlx::Error) -> CoreError {
    tracing::error!(error = %e, "Database error");
    CoreError::Internal(format!("database error: {e}"))
}

impl SettingStore for PgStore {
    async fn find_setting(
        &self,
        patient_id: DbId,
        measurement: &str,
    ) -> Result<Option<Setting>, CoreError> {
        let row = SettingRepo::find(&self.pool, patient_id, measurement)
            .await
            .map_err(internal)?;
        Ok(row.map(Setting::from))
    }
}

impl PatientStore for PgStore {
    async fn find_patient_alert_level(
        &self,
        patient_id: DbId,
    ) -> Result<Option<AlertLevel>, CoreError> {
        PatientRepo::find_alert_level(&self.pool, patient_id)
            .await
            .map_err(internal)?
            .map(AlertLevel::try_from)
            .transpose()
    }

    async fn update_patient_alert_level(
        &self,
        patient_id: DbId,
        level: AlertLevel,
    ) -> Result<(), CoreError> {
        let updated = PatientRepo::update_alert_level(&self.pool, patient_id, level.as_i16())
            .await
            .map_err(internal)?;
        if !updated {
            return Err(CoreError::not_found("Patient", patient_id));
        }
        Ok(())
    }
}

impl AlertStore for PgStore {
    async fn create_alert_record(&self, alert: NewAlert) -> Result<Alert, CoreError> {
        AlertRepo::create(&self.pool, &alert)
            .await
            .map_err(internal)?
            .try_into()
    }

    async fn find_alert(&self, alert_id: DbId) -> Result<Option<Alert>, CoreError> {
        AlertRepo::find_by_id(&self.pool, alert_id)
            .await
            .map_err(internal)?
            .map(Alert::try_from)
            .transpose()
    }

    async fn count_open_alerts(
        &self,
        patient_id: DbId,
        level: AlertLevel,
    ) -> Result<i64, CoreError> {
        AlertRepo::count_open(&self.pool, patient_id, level.as_i16())
            .await
            .map_err(internal)
    }

    async fn resolve_alert_record(
        &self,
        alert_id: DbId,
        clinician_id: DbId,
    ) -> Result<Alert, CoreError> {
        AlertRepo::resolve(&self.pool, alert_id, clinician_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::not_found("Alert", alert_id))?
            .try_into()
    }

    async fn list_alerts(&self, patient_id: DbId) -> Result<Vec<Alert>, CoreError> {
        AlertRepo::list_for_patient(&self.pool, patient_id)
            .await
            .map_err(internal)?
            .into_iter()
            .map(Alert::try_from)
            .collect()
    }
}

impl DeviceStore for PgStore {
    async fn find_device(&self, identity: DeviceIdentity) -> Result<Option<Device>, CoreError> {
        let row = DeviceRepo::find(&self.pool, identity)
            .await
            .map_err(internal)?;
        Ok(row.map(Device::from))
    }

    async fn update_device_metadata(
        &self,
        identity: DeviceIdentity,
        update: DeviceTelemetryUpdate,
    ) -> Result<(), CoreError> {
        let updated = DeviceRepo::update_telemetry(&self.pool, identity, &update)
            .await
            .map_err(internal)?;
        if !updated {
            return Err(CoreError::not_found("Device", identity));
        }
        Ok(())
    }
}

impl ObservationStore for PgStore {
    async fn insert_observations(&self, observations: &[NewObservation]) -> Result<u64, CoreError> {
        ObservationRepo::insert_batch(&self.pool, observations)
            .await
            .map_err(internal)
    }
}

impl CareDirectory for PgStore {
    async fn resolve_clinician(&self, auth_id: &str) -> Result<Option<DbId>, CoreError> {
        CareGroupRepo::find_clinician_id(&self.pool, auth_id)
            .await
            .map_err(internal)
    }

    async fn same_care_group(&self, auth_id: &str, patient_id: DbId) -> Result<bool, CoreError> {
        CareGroupRepo::shares_care_group(&self.pool, auth_id, patient_id)
            .await
            .map_err(internal)
    }
}
