use serde::Deserialize;
use somnus_core::measurement::Threshold;
use somnus_core::types::DbId;
use sqlx::FromRow;

/// A row from the `thresholds` table.
#[derive(Debug, Clone, FromRow)]
pub struct ThresholdRow {
    pub id: DbId,
    pub patient_id: DbId,
    pub measurement: String,
    pub lower_value: Option<f64>,
    pub upper_value: Option<f64>,
    pub comments: String,
    pub unit: String,
    pub active: bool,
}

impl From<ThresholdRow> for Threshold {
    fn from(row: ThresholdRow) -> Self {
        Threshold {
            threshold_id: row.id,
            patient_id: row.patient_id,
            measurement: row.measurement,
            lower_value: row.lower_value,
            upper_value: row.upper_value,
            comments: row.comments,
            unit: row.unit,
            active: row.active,
        }
    }
}

/// DTO for editing a single threshold.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateThreshold {
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    pub measurement: String,
    pub lower_value: Option<f64>,
    pub upper_value: Option<f64>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub active: bool,
}
