mod common;

use axum::http::{Method, StatusCode};

use common::{body_json, build_test_app, send, unreachable_pool};

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = build_test_app(unreachable_pool());

    let response = send(app, Method::GET, "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
}
