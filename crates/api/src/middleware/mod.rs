//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the staff member behind a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireStaff`] -- requires `clinician` or `admin`.
//! - [`device::AuthDevice`] -- the device behind a device session token.

pub mod auth;
pub mod device;
pub mod rbac;

use axum::http::request::Parts;
use somnus_core::error::CoreError;

use crate::error::AppError;

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })
}
