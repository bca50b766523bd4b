use axum::routing::{get, post};
use axum::Router;

use crate::handlers::device;
use crate::state::AppState;

/// Device routes: PIN login for the hardware, provisioning for staff.
///
/// ```text
/// POST   /device/login              -> login
/// GET    /device/last-transmission  -> last_transmission
/// POST   /device                    -> provision_device
/// GET    /device/{patient_id}       -> get_device
/// DELETE /device/{patient_id}       -> deprovision_device
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/device/login", post(device::login))
        .route("/device/last-transmission", get(device::last_transmission))
        .route("/device", post(device::provision_device))
        .route(
            "/device/{patient_id}",
            get(device::get_device).delete(device::deprovision_device),
        )
}
