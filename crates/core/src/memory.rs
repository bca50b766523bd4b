//! In-process [`MonitoringStore`](crate::store::MonitoringStore) backed by plain
//! collections. Used by the core's own tests and by local tooling that has no
//! database at hand.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::alert::{Alert, AlertLevel, NewAlert};
use crate::error::CoreError;
use crate::measurement::{default_settings, Setting};
use crate::store::{
    AlertStore, CareDirectory, Device, DeviceStore, DeviceTelemetryUpdate, ObservationStore,
    PatientStore, SettingStore,
};
use crate::telemetry::{DeviceIdentity, NewObservation};
use crate::types::DbId;

#[derive(Debug, Default)]
struct State {
    patients: HashMap<DbId, AlertLevel>,
    settings: Vec<Setting>,
    alerts: Vec<Alert>,
    devices: HashMap<DeviceIdentity, Device>,
    observations: Vec<NewObservation>,
    clinicians: HashMap<String, DbId>,
    care_groups: HashMap<String, HashSet<DbId>>,
    admins: HashSet<String>,
    next_id: DbId,
    fail_directory: bool,
    fail_observations: bool,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a patient at level 0 with the default settings.
    pub fn add_patient(&self, patient_id: DbId) {
        let mut state = self.state();
        state.patients.insert(patient_id, AlertLevel::Normal);
        for default in default_settings() {
            let setting_id = state.next_id();
            state.settings.push(Setting {
                setting_id,
                patient_id,
                setting_name: default.setting_name.to_string(),
                primary_value: default.primary_value,
                secondary_value: default.secondary_value,
                tertiary_value: None,
                unit: default.unit.to_string(),
                change_reason: default.change_reason.to_string(),
            });
        }
    }

    /// Replace (or remove, with `None`) one of a patient's settings.
    pub fn put_setting(&self, patient_id: DbId, name: &str, setting: Option<Setting>) {
        let mut state = self.state();
        state
            .settings
            .retain(|s| !(s.patient_id == patient_id && s.setting_name == name));
        state.settings.extend(setting);
    }

    /// Register a clinician and place them in the care group of `patients`.
    pub fn add_clinician(&self, auth_id: &str, clinician_id: DbId, patients: &[DbId]) {
        let mut state = self.state();
        state.clinicians.insert(auth_id.to_string(), clinician_id);
        state
            .care_groups
            .entry(auth_id.to_string())
            .or_default()
            .extend(patients.iter().copied());
    }

    /// Put a non-clinician identity in a patient's care group.
    pub fn add_care_group_member(&self, auth_id: &str, patient_id: DbId) {
        self.state()
            .care_groups
            .entry(auth_id.to_string())
            .or_default()
            .insert(patient_id);
    }

    pub fn add_admin(&self, auth_id: &str) {
        self.state().admins.insert(auth_id.to_string());
    }

    pub fn add_device(&self, identity: DeviceIdentity, device_pin: i32, patient_id: Option<DbId>) {
        self.state().devices.insert(
            identity,
            Device {
                identity,
                device_pin,
                patient_id,
                battery_level: 100,
                battery_health: 100,
                last_login: None,
                last_transmission: None,
            },
        );
    }

    /// Make every care directory call fail.
    pub fn fail_directory(&self, fail: bool) {
        self.state().fail_directory = fail;
    }

    /// Make observation inserts fail.
    pub fn fail_observations(&self, fail: bool) {
        self.state().fail_observations = fail;
    }

    pub fn device(&self, identity: DeviceIdentity) -> Option<Device> {
        self.state().devices.get(&identity).cloned()
    }

    pub fn observations(&self) -> Vec<NewObservation> {
        self.state().observations.clone()
    }

    pub fn open_alert_count(&self, patient_id: DbId) -> usize {
        self.state()
            .alerts
            .iter()
            .filter(|a| a.patient_id == patient_id && !a.is_resolved)
            .count()
    }
}

impl SettingStore for MemoryStore {
    async fn find_setting(
        &self,
        patient_id: DbId,
        measurement: &str,
    ) -> Result<Option<Setting>, CoreError> {
        Ok(self
            .state()
            .settings
            .iter()
            .find(|s| s.patient_id == patient_id && s.setting_name == measurement)
            .cloned())
    }
}

impl PatientStore for MemoryStore {
    async fn find_patient_alert_level(
        &self,
        patient_id: DbId,
    ) -> Result<Option<AlertLevel>, CoreError> {
        Ok(self.state().patients.get(&patient_id).copied())
    }

    async fn update_patient_alert_level(
        &self,
        patient_id: DbId,
        level: AlertLevel,
    ) -> Result<(), CoreError> {
        let mut state = self.state();
        let current = state
            .patients
            .get_mut(&patient_id)
            .ok_or_else(|| CoreError::not_found("Patient", patient_id))?;
        *current = level;
        Ok(())
    }
}

impl AlertStore for MemoryStore {
    async fn create_alert_record(&self, alert: NewAlert) -> Result<Alert, CoreError> {
        let mut state = self.state();
        if !state.patients.contains_key(&alert.patient_id) {
            return Err(CoreError::not_found("Patient", alert.patient_id));
        }
        let now = Utc::now();
        let alert = Alert {
            alert_id: state.next_id(),
            patient_id: alert.patient_id,
            clinician_id: alert.clinician_id,
            alert_name: alert.alert_name,
            description: alert.description,
            alert_level: alert.alert_level,
            is_resolved: false,
            created_at: now,
            updated_at: now,
        };
        state.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn find_alert(&self, alert_id: DbId) -> Result<Option<Alert>, CoreError> {
        Ok(self
            .state()
            .alerts
            .iter()
            .find(|a| a.alert_id == alert_id)
            .cloned())
    }

    async fn count_open_alerts(
        &self,
        patient_id: DbId,
        level: AlertLevel,
    ) -> Result<i64, CoreError> {
        let count = self
            .state()
            .alerts
            .iter()
            .filter(|a| a.patient_id == patient_id && !a.is_resolved && a.alert_level == level)
            .count();
        Ok(count as i64)
    }

    async fn resolve_alert_record(
        &self,
        alert_id: DbId,
        clinician_id: DbId,
    ) -> Result<Alert, CoreError> {
        let mut state = self.state();
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.alert_id == alert_id)
            .ok_or_else(|| CoreError::not_found("Alert", alert_id))?;
        alert.is_resolved = true;
        alert.alert_level = AlertLevel::Normal;
        alert.clinician_id = Some(clinician_id);
        alert.updated_at = Utc::now();
        Ok(alert.clone())
    }

    async fn list_alerts(&self, patient_id: DbId) -> Result<Vec<Alert>, CoreError> {
        let mut alerts: Vec<Alert> = self
            .state()
            .alerts
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.alert_id.cmp(&a.alert_id));
        Ok(alerts)
    }
}

impl DeviceStore for MemoryStore {
    async fn find_device(&self, identity: DeviceIdentity) -> Result<Option<Device>, CoreError> {
        Ok(self.device(identity))
    }

    async fn update_device_metadata(
        &self,
        identity: DeviceIdentity,
        update: DeviceTelemetryUpdate,
    ) -> Result<(), CoreError> {
        let mut state = self.state();
        let device = state
            .devices
            .get_mut(&identity)
            .ok_or_else(|| CoreError::not_found("Device", identity))?;
        device.battery_level = update.battery_level;
        device.battery_health = update.battery_health;
        device.last_transmission = Some(update.last_transmission);
        Ok(())
    }
}

impl ObservationStore for MemoryStore {
    async fn insert_observations(&self, observations: &[NewObservation]) -> Result<u64, CoreError> {
        let mut state = self.state();
        if state.fail_observations {
            return Err(CoreError::Internal("observation store unavailable".into()));
        }
        state.observations.extend_from_slice(observations);
        Ok(observations.len() as u64)
    }
}

impl CareDirectory for MemoryStore {
    async fn resolve_clinician(&self, auth_id: &str) -> Result<Option<DbId>, CoreError> {
        let state = self.state();
        if state.fail_directory {
            return Err(CoreError::Internal("care directory unavailable".into()));
        }
        Ok(state.clinicians.get(auth_id).copied())
    }

    async fn same_care_group(&self, auth_id: &str, patient_id: DbId) -> Result<bool, CoreError> {
        let state = self.state();
        if state.fail_directory {
            return Err(CoreError::Internal("care directory unavailable".into()));
        }
        Ok(state.admins.contains(auth_id)
            || state
                .care_groups
                .get(auth_id)
                .is_some_and(|patients| patients.contains(&patient_id)))
    }
}
