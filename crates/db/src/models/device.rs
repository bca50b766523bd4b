use serde::Deserialize;
use somnus_core::store::Device;
use somnus_core::telemetry::DeviceIdentity;
use somnus_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `devices` table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceRow {
    pub cradle_id: i64,
    pub mouthguard_id: i64,
    pub device_pin: i32,
    pub patient_id: Option<DbId>,
    pub battery_level: i32,
    pub battery_health: i32,
    pub last_login: Option<Timestamp>,
    pub last_transmission: Option<Timestamp>,
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            identity: DeviceIdentity {
                cradle_id: row.cradle_id,
                mouthguard_id: row.mouthguard_id,
            },
            device_pin: row.device_pin,
            patient_id: row.patient_id,
            battery_level: row.battery_level,
            battery_health: row.battery_health,
            last_login: row.last_login,
            last_transmission: row.last_transmission,
        }
    }
}

/// DTO for assigning a device pair to a patient.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionDevice {
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    #[serde(flatten)]
    pub identity: DeviceIdentity,
}
