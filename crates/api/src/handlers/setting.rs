//! Handlers for per-patient screening settings.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use somnus_core::error::CoreError;
use somnus_core::measurement::{default_settings, validate_setting, DefaultSetting, Setting};
use somnus_core::types::DbId;
use somnus_db::models::setting::UpdateSetting;
use somnus_db::repositories::SettingRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{require_care_group, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for editing a patient's settings in one batch.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    pub settings: Vec<UpdateSetting>,
}

/// GET /settings
pub async fn get_default_settings(
    RequireStaff(_user): RequireStaff,
) -> AppResult<Json<DataResponse<Vec<DefaultSetting>>>> {
    Ok(Json(DataResponse {
        data: default_settings(),
    }))
}

/// GET /settings/{patient_id}
pub async fn list_settings(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Setting>>>> {
    require_care_group(&state, &user, patient_id).await?;
    let settings = SettingRepo::list_for_patient(&state.pool, patient_id).await?;
    if settings.is_empty() {
        return Err(CoreError::not_found("Settings for patient", patient_id).into());
    }
    Ok(Json(DataResponse {
        data: settings.into_iter().map(Setting::from).collect(),
    }))
}

/// PUT /settings
///
/// Every edit is validated before any is written; the batch is applied in
/// one transaction.
pub async fn update_settings(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<UpdateSettingsRequest>,
) -> AppResult<Json<DataResponse<Vec<Setting>>>> {
    if input.settings.is_empty() {
        return Err(AppError::BadRequest("No settings supplied".into()));
    }
    for setting in &input.settings {
        validate_setting(
            &setting.setting_name,
            setting.primary_value,
            setting.secondary_value,
        )?;
    }
    require_care_group(&state, &user, input.patient_id).await?;

    let updated = SettingRepo::update_batch(&state.pool, input.patient_id, &input.settings)
        .await?
        .ok_or_else(|| CoreError::not_found("Settings for patient", input.patient_id))?;

    tracing::info!(
        patient_id = input.patient_id,
        count = updated.len(),
        by = %user.auth_id,
        "Settings updated"
    );
    Ok(Json(DataResponse {
        data: updated.into_iter().map(Setting::from).collect(),
    }))
}
