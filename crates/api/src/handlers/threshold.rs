//! Handlers for clinician-facing thresholds.

use axum::extract::{Path, State};
use axum::Json;
use somnus_core::error::CoreError;
use somnus_core::measurement::{policy_for, Threshold};
use somnus_core::types::DbId;
use somnus_db::models::threshold::UpdateThreshold;
use somnus_db::repositories::ThresholdRepo;

use crate::error::AppResult;
use crate::middleware::rbac::{require_care_group, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /thresholds/{patient_id}
pub async fn list_thresholds(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Threshold>>>> {
    require_care_group(&state, &user, patient_id).await?;
    let rows = ThresholdRepo::list_for_patient(&state.pool, patient_id).await?;
    Ok(Json(DataResponse {
        data: rows.into_iter().map(Threshold::from).collect(),
    }))
}

/// PUT /thresholds
pub async fn update_threshold(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<UpdateThreshold>,
) -> AppResult<Json<DataResponse<Threshold>>> {
    policy_for(&input.measurement)?;
    if let (Some(lower), Some(upper)) = (input.lower_value, input.upper_value) {
        if lower > upper {
            return Err(CoreError::Validation(format!(
                "{} lower value {lower} exceeds upper value {upper}",
                input.measurement
            ))
            .into());
        }
    }
    require_care_group(&state, &user, input.patient_id).await?;

    let row = ThresholdRepo::update(&state.pool, &input)
        .await?
        .ok_or_else(|| {
            CoreError::not_found(
                "Threshold",
                format!("{}/{}", input.patient_id, input.measurement),
            )
        })?;
    Ok(Json(DataResponse {
        data: Threshold::from(row),
    }))
}
