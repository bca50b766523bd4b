use serde::Serialize;
use somnus_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A stored observation, as served back to clinicians.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRow {
    #[serde(rename = "observationID")]
    pub id: DbId,
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    pub measurement: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub sample_rate: f64,
    /// Scalar text or a JSON array of samples, exactly as ingested.
    pub data_points: String,
    pub created_at: Timestamp,
}
