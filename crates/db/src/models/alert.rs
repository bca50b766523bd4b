//! Alert rows.

use somnus_core::alert::{Alert, AlertLevel};
use somnus_core::error::CoreError;
use somnus_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `alerts` table.
#[derive(Debug, Clone, FromRow)]
pub struct AlertRow {
    pub id: DbId,
    pub patient_id: DbId,
    pub clinician_id: Option<DbId>,
    pub alert_name: String,
    pub description: String,
    pub alert_level: i16,
    pub is_resolved: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<AlertRow> for Alert {
    type Error = CoreError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            alert_id: row.id,
            patient_id: row.patient_id,
            clinician_id: row.clinician_id,
            alert_name: row.alert_name,
            description: row.description,
            alert_level: AlertLevel::try_from(row.alert_level)?,
            is_resolved: row.is_resolved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
