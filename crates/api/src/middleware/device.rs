//! Device session extractor for the telemetry endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use somnus_core::error::CoreError;
use somnus_core::telemetry::DeviceIdentity;

use super::bearer_token;
use crate::auth::jwt::validate_device_token;
use crate::error::AppError;
use crate::state::AppState;

/// A device that presented a valid session token from `/device/login`.
#[derive(Debug, Clone, Copy)]
pub struct AuthDevice(pub DeviceIdentity);

impl FromRequestParts<AppState> for AuthDevice {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = validate_device_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired device token".into(),
            ))
        })?;
        Ok(AuthDevice(claims.identity()))
    }
}
