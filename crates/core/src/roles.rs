//! Well-known role name constants.
//!
//! These must match the `role` check constraint on the `users` table.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CLINICIAN: &str = "clinician";
pub const ROLE_PATIENT: &str = "patient";

/// Staff roles may read and act on patient data within their care groups.
pub fn is_staff(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_CLINICIAN
}
