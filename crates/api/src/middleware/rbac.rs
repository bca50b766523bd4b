//! Role-based access control (RBAC) extractors and care-group checks.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use somnus_core::error::CoreError;
use somnus_core::roles::{is_staff, ROLE_ADMIN};
use somnus_core::types::DbId;
use somnus_db::repositories::CareGroupRepo;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires `clinician` or `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !is_staff(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Clinician or Admin role required".into(),
            )));
        }
        Ok(RequireStaff(user))
    }
}

/// Reject with 403 unless `user` shares a care group with the patient.
pub async fn require_care_group(
    state: &AppState,
    user: &AuthUser,
    patient_id: DbId,
) -> Result<(), AppError> {
    if CareGroupRepo::shares_care_group(&state.pool, &user.auth_id, patient_id).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "You are not in the same care group".into(),
        )))
    }
}
