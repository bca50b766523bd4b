use axum::routing::{get, post};
use axum::Router;

use crate::handlers::data;
use crate::state::AppState;

/// ```text
/// POST /data               -> receive_data (device token)
/// GET  /data/{patient_id}  -> list_patient_data
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data", post(data::receive_data))
        .route("/data/{patient_id}", get(data::list_patient_data))
}
