//! Per-patient screening settings.

use serde::Deserialize;
use somnus_core::measurement::Setting;
use somnus_core::types::DbId;
use sqlx::FromRow;

/// A row from the `settings` table.
#[derive(Debug, Clone, FromRow)]
pub struct SettingRow {
    pub id: DbId,
    pub patient_id: DbId,
    pub setting_name: String,
    pub primary_value: f64,
    pub secondary_value: Option<f64>,
    pub tertiary_value: Option<f64>,
    pub unit: String,
    pub change_reason: String,
}

impl From<SettingRow> for Setting {
    fn from(row: SettingRow) -> Self {
        Setting {
            setting_id: row.id,
            patient_id: row.patient_id,
            setting_name: row.setting_name,
            primary_value: row.primary_value,
            secondary_value: row.secondary_value,
            tertiary_value: row.tertiary_value,
            unit: row.unit,
            change_reason: row.change_reason,
        }
    }
}

/// DTO for editing one of a patient's settings. The unit is fixed per
/// measurement and cannot be changed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSetting {
    pub setting_name: String,
    pub primary_value: f64,
    pub secondary_value: Option<f64>,
    pub tertiary_value: Option<f64>,
    #[serde(default)]
    pub change_reason: String,
}
