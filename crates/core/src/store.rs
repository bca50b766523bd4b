//! Collaborator interfaces consumed by the alert ledger and the ingestion
//! orchestrator.
//!
//! Implementations own timeouts and connection management; the core never
//! retries a failed call. All failures are reported as [`CoreError`], with
//! backend failures mapped to [`CoreError::Internal`].

use std::future::Future;

use crate::alert::{Alert, AlertLevel, NewAlert};
use crate::error::CoreError;
use crate::measurement::Setting;
use crate::telemetry::{DeviceIdentity, NewObservation};
use crate::types::{DbId, Timestamp};

/// A registered device pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub identity: DeviceIdentity,
    pub device_pin: i32,
    /// Owning patient; `None` while the device is not provisioned.
    pub patient_id: Option<DbId>,
    pub battery_level: i32,
    pub battery_health: i32,
    pub last_login: Option<Timestamp>,
    pub last_transmission: Option<Timestamp>,
}

/// Battery and transmission bookkeeping written on every upload.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceTelemetryUpdate {
    pub battery_level: i32,
    pub battery_health: i32,
    pub last_transmission: Timestamp,
}

/// Per-patient settings lookup.
pub trait SettingStore: Send + Sync {
    fn find_setting(
        &self,
        patient_id: DbId,
        measurement: &str,
    ) -> impl Future<Output = Result<Option<Setting>, CoreError>> + Send;
}

/// Access to the patient's aggregate alert level.
pub trait PatientStore: Send + Sync {
    /// Returns `None` when the patient does not exist.
    fn find_patient_alert_level(
        &self,
        patient_id: DbId,
    ) -> impl Future<Output = Result<Option<AlertLevel>, CoreError>> + Send;

    fn update_patient_alert_level(
        &self,
        patient_id: DbId,
        level: AlertLevel,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Alert records.
pub trait AlertStore: Send + Sync {
    fn create_alert_record(
        &self,
        alert: NewAlert,
    ) -> impl Future<Output = Result<Alert, CoreError>> + Send;

    fn find_alert(
        &self,
        alert_id: DbId,
    ) -> impl Future<Output = Result<Option<Alert>, CoreError>> + Send;

    /// Count the patient's unresolved alerts at exactly `level`.
    fn count_open_alerts(
        &self,
        patient_id: DbId,
        level: AlertLevel,
    ) -> impl Future<Output = Result<i64, CoreError>> + Send;

    /// Mark an alert resolved by `clinician_id` and drop its level to normal.
    fn resolve_alert_record(
        &self,
        alert_id: DbId,
        clinician_id: DbId,
    ) -> impl Future<Output = Result<Alert, CoreError>> + Send;

    /// All alerts for a patient, newest first.
    fn list_alerts(
        &self,
        patient_id: DbId,
    ) -> impl Future<Output = Result<Vec<Alert>, CoreError>> + Send;
}

/// Device registry and per-upload bookkeeping.
pub trait DeviceStore: Send + Sync {
    fn find_device(
        &self,
        identity: DeviceIdentity,
    ) -> impl Future<Output = Result<Option<Device>, CoreError>> + Send;

    fn update_device_metadata(
        &self,
        identity: DeviceIdentity,
        update: DeviceTelemetryUpdate,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Persisted observations.
pub trait ObservationStore: Send + Sync {
    /// Insert every observation or none of them.
    fn insert_observations(
        &self,
        observations: &[NewObservation],
    ) -> impl Future<Output = Result<u64, CoreError>> + Send;
}

/// Identity and care-group membership, owned outside the core.
pub trait CareDirectory: Send + Sync {
    /// Map an external auth identity to a clinician id, if it names one.
    fn resolve_clinician(
        &self,
        auth_id: &str,
    ) -> impl Future<Output = Result<Option<DbId>, CoreError>> + Send;

    /// Whether the requester may act on the patient (admins always may).
    fn same_care_group(
        &self,
        auth_id: &str,
        patient_id: DbId,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;
}

/// Everything the ledger and the orchestrator need from storage.
pub trait MonitoringStore:
    SettingStore + PatientStore + AlertStore + DeviceStore + ObservationStore + CareDirectory
{
}

impl<T> MonitoringStore for T where
    T: SettingStore + PatientStore + AlertStore + DeviceStore + ObservationStore + CareDirectory
{
}
