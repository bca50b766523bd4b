use axum::routing::{get, put};
use axum::Router;

use crate::handlers::threshold;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/thresholds/{patient_id}", get(threshold::list_thresholds))
        .route("/thresholds", put(threshold::update_threshold))
}
