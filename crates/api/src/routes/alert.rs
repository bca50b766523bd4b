use axum::routing::{get, put};
use axum::Router;

use crate::handlers::alert;
use crate::state::AppState;

/// Alert routes.
///
/// ```text
/// GET  /alert/{patient_id}   -> get_alert_level
/// PUT  /alert                -> set_alert_level (admin)
/// GET  /alerts/{patient_id}  -> list_alerts
/// POST /alerts               -> create_alert
/// PUT  /alerts               -> resolve_alert
/// GET  /clinician-alerts     -> list_clinician_alerts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alert/{patient_id}", get(alert::get_alert_level))
        .route("/alert", put(alert::set_alert_level))
        .route("/alerts/{patient_id}", get(alert::list_alerts))
        .route(
            "/alerts",
            axum::routing::post(alert::create_alert).put(alert::resolve_alert),
        )
        .route("/clinician-alerts", get(alert::list_clinician_alerts))
}
