pub mod alert;
pub mod data;
pub mod device;
pub mod health;
pub mod setting;
pub mod threshold;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /device/login                   device PIN login (public)
/// /device/last-transmission       last upload time (device token)
/// /device                         provision a device (staff, POST)
/// /device/{patient_id}            show, deprovision (staff)
///
/// /data                           telemetry upload (device token)
/// /data/{patient_id}              stored observations (staff)
///
/// /alert/{patient_id}             aggregate level (staff)
/// /alert                          override aggregate level (admin)
/// /alerts/{patient_id}            list alerts (staff)
/// /alerts                         create, resolve (staff)
/// /clinician-alerts               alerts across care groups (staff)
///
/// /settings                       default settings (staff)
/// /settings/{patient_id}          list settings (staff)
/// /settings                       edit settings (staff, PUT)
///
/// /thresholds/{patient_id}        list thresholds (staff)
/// /thresholds                     edit one threshold (staff, PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(device::router())
        .merge(data::router())
        .merge(alert::router())
        .merge(setting::router())
        .merge(threshold::router())
}
