//! Handlers for telemetry upload and stored observations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use somnus_core::error::CoreError;
use somnus_core::ingest::IngestReport;
use somnus_core::telemetry::Transmission;
use somnus_core::types::DbId;
use somnus_db::models::observation::ObservationRow;
use somnus_db::repositories::{ObservationRepo, PatientRepo};

use crate::error::AppResult;
use crate::middleware::device::AuthDevice;
use crate::middleware::rbac::{require_care_group, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

/// Upload body: the transmission sits under a top-level `data` key.
#[derive(Debug, Deserialize)]
pub struct DataUpload {
    pub data: Transmission,
}

/// POST /data
///
/// Ingest one transmission from the authenticated device.
pub async fn receive_data(
    State(state): State<AppState>,
    AuthDevice(identity): AuthDevice,
    Json(upload): Json<DataUpload>,
) -> AppResult<(StatusCode, Json<DataResponse<IngestReport>>)> {
    let report = state
        .ingestion
        .receive_transmission(identity, upload.data)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// GET /data/{patient_id}
pub async fn list_patient_data(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ObservationRow>>>> {
    require_care_group(&state, &user, patient_id).await?;
    if PatientRepo::find_alert_level(&state.pool, patient_id)
        .await?
        .is_none()
    {
        return Err(CoreError::not_found("Patient", patient_id).into());
    }
    let observations = ObservationRepo::list_for_patient(&state.pool, patient_id).await?;
    Ok(Json(DataResponse { data: observations }))
}
