use axum::routing::get;
use axum::Router;

use crate::handlers::setting;
use crate::state::AppState;

/// ```text
/// GET /settings               -> get_default_settings
/// PUT /settings               -> update_settings
/// GET /settings/{patient_id}  -> list_settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/settings",
            get(setting::get_default_settings).put(setting::update_settings),
        )
        .route("/settings/{patient_id}", get(setting::list_settings))
}
