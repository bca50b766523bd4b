//! Handlers for device login and staff-side device provisioning.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use somnus_core::device::generate_device_pin;
use somnus_core::error::CoreError;
use somnus_core::telemetry::DeviceIdentity;
use somnus_core::types::{DbId, Timestamp};
use somnus_db::models::device::{DeviceRow, ProvisionDevice};
use somnus_db::repositories::{DeviceRepo, PatientRepo};

use crate::auth::jwt::generate_device_token;
use crate::error::{AppError, AppResult};
use crate::middleware::device::AuthDevice;
use crate::middleware::rbac::{require_care_group, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLoginRequest {
    #[serde(flatten)]
    pub identity: DeviceIdentity,
    pub device_pin: i32,
}

#[derive(Debug, Serialize)]
pub struct DeviceLoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastTransmissionResponse {
    pub last_transmission: Option<Timestamp>,
}

/// A patient's registered device, as shown to staff.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    #[serde(flatten)]
    pub identity: DeviceIdentity,
    #[serde(rename = "patientID")]
    pub patient_id: Option<DbId>,
    pub device_pin: i32,
    pub battery_level: i32,
    pub battery_health: i32,
    pub last_login: Option<Timestamp>,
    pub last_transmission: Option<Timestamp>,
}

impl From<DeviceRow> for DeviceResponse {
    fn from(row: DeviceRow) -> Self {
        Self {
            identity: DeviceIdentity {
                cradle_id: row.cradle_id,
                mouthguard_id: row.mouthguard_id,
            },
            patient_id: row.patient_id,
            device_pin: row.device_pin,
            battery_level: row.battery_level,
            battery_health: row.battery_health,
            last_login: row.last_login,
            last_transmission: row.last_transmission,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /device/login
///
/// Exchange a cradle/mouthguard pair and PIN for a device session token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<DeviceLoginRequest>,
) -> AppResult<Json<DataResponse<DeviceLoginResponse>>> {
    let identity = input.identity;
    let device = DeviceRepo::find(&state.pool, identity).await?;
    if !device.is_some_and(|d| d.device_pin == input.device_pin) {
        tracing::warn!(device = %identity, "Device login rejected");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Incorrect details".into(),
        )));
    }

    DeviceRepo::record_login(&state.pool, identity).await?;
    let token = generate_device_token(identity, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Failed to sign device token: {e}")))?;

    tracing::info!(device = %identity, "Device logged in");
    Ok(Json(DataResponse {
        data: DeviceLoginResponse { token },
    }))
}

/// GET /device/last-transmission
pub async fn last_transmission(
    State(state): State<AppState>,
    AuthDevice(identity): AuthDevice,
) -> AppResult<Json<DataResponse<LastTransmissionResponse>>> {
    let device = DeviceRepo::find(&state.pool, identity)
        .await?
        .ok_or_else(|| CoreError::not_found("Device", identity))?;
    Ok(Json(DataResponse {
        data: LastTransmissionResponse {
            last_transmission: device.last_transmission,
        },
    }))
}

/// GET /device/{patient_id}
pub async fn get_device(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<DeviceResponse>>> {
    require_care_group(&state, &user, patient_id).await?;
    let device = DeviceRepo::find_for_patient(&state.pool, patient_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Device for patient", patient_id))?;
    Ok(Json(DataResponse {
        data: device.into(),
    }))
}

/// POST /device
///
/// Assign a cradle/mouthguard pair to a patient and issue its login PIN.
/// A pair that is already registered, or a patient who already wears a
/// device, is rejected with 409.
pub async fn provision_device(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<ProvisionDevice>,
) -> AppResult<(StatusCode, Json<DataResponse<DeviceResponse>>)> {
    require_care_group(&state, &user, input.patient_id).await?;
    if PatientRepo::find_alert_level(&state.pool, input.patient_id)
        .await?
        .is_none()
    {
        return Err(CoreError::not_found("Patient", input.patient_id).into());
    }

    let device = DeviceRepo::provision(
        &state.pool,
        input.identity,
        input.patient_id,
        generate_device_pin(),
    )
    .await?;

    tracing::info!(
        device = %input.identity,
        patient_id = input.patient_id,
        by = %user.auth_id,
        "Device provisioned"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: device.into(),
        }),
    ))
}

/// DELETE /device/{patient_id}
pub async fn deprovision_device(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(patient_id): Path<DbId>,
) -> AppResult<StatusCode> {
    require_care_group(&state, &user, patient_id).await?;
    if DeviceRepo::deprovision(&state.pool, patient_id).await? {
        tracing::info!(patient_id, by = %user.auth_id, "Device deprovisioned");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found(
            "Device for patient",
            patient_id,
        )))
    }
}
