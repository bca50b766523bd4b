//! Handlers for patient alerts and the aggregate alert level.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use somnus_core::alert::{Alert, AlertLevel};
use somnus_core::types::DbId;
use somnus_db::repositories::AlertRepo;

use crate::error::AppResult;
use crate::middleware::rbac::{require_care_group, RequireAdmin, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientAlertLevel {
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    pub alert_level: AlertLevel,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    pub alert_name: String,
    pub description: String,
    pub alert_level: AlertLevel,
}

#[derive(Debug, Deserialize)]
pub struct ResolveAlertRequest {
    #[serde(rename = "alertID")]
    pub alert_id: DbId,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /alert/{patient_id}
pub async fn get_alert_level(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<PatientAlertLevel>>> {
    require_care_group(&state, &user, patient_id).await?;
    let alert_level = state.ledger().get_alert_level(patient_id).await?;
    Ok(Json(DataResponse {
        data: PatientAlertLevel {
            patient_id,
            alert_level,
        },
    }))
}

/// PUT /alert
///
/// Admin override of a patient's aggregate level.
pub async fn set_alert_level(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<PatientAlertLevel>,
) -> AppResult<Json<DataResponse<PatientAlertLevel>>> {
    state
        .ledger()
        .set_alert_level(input.patient_id, input.alert_level)
        .await?;
    tracing::info!(
        patient_id = input.patient_id,
        level = %input.alert_level,
        admin = %admin.auth_id,
        "Alert level overridden"
    );
    Ok(Json(DataResponse { data: input }))
}

/// GET /alerts/{patient_id}
pub async fn list_alerts(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Alert>>>> {
    require_care_group(&state, &user, patient_id).await?;
    let alerts = state.ledger().list_alerts(patient_id).await?;
    Ok(Json(DataResponse { data: alerts }))
}

/// GET /clinician-alerts
///
/// Alerts across every patient in the caller's care groups; admins see all.
pub async fn list_clinician_alerts(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
) -> AppResult<Json<DataResponse<Vec<Alert>>>> {
    let alerts = AlertRepo::list_visible_to(&state.pool, &user.auth_id)
        .await?
        .into_iter()
        .map(Alert::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(DataResponse { data: alerts }))
}

/// POST /alerts
///
/// Open an alert by hand; the caller is recorded as the raising clinician.
pub async fn create_alert(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateAlertRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Alert>>)> {
    require_care_group(&state, &user, input.patient_id).await?;
    let alert = state
        .ledger()
        .create_alert(
            input.patient_id,
            &input.alert_name,
            &input.description,
            input.alert_level,
            Some(user.auth_id.as_str()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: alert })))
}

/// PUT /alerts
///
/// Resolve an alert. Care-group membership is checked by the ledger.
pub async fn resolve_alert(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<ResolveAlertRequest>,
) -> AppResult<Json<DataResponse<Alert>>> {
    let alert = state
        .ledger()
        .resolve_alert(input.alert_id, &user.auth_id)
        .await?;
    Ok(Json(DataResponse { data: alert }))
}
