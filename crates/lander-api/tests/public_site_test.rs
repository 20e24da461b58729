//! Public delivery, tracking scripts and health checks.

mod helpers;

use helpers::{api_path, bearer, deploy_sample_site, setup_test_app};

#[tokio::test]
async fn test_serves_published_index_and_assets() {
    let app = setup_test_app();
    deploy_sample_site(&app, "Public").await;

    let response = app.client().get("/lp/0").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "text/html; charset=utf-8");
    assert_eq!(response.header("cache-control"), "public, max-age=60");
    assert!(response.text().contains("<footer>"));

    let response = app.client().get("/lp/0/css/style.css").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "text/css; charset=utf-8");
    assert_eq!(
        response.header("cache-control"),
        "public, max-age=31536000, immutable"
    );
}

#[tokio::test]
async fn test_unpublished_site_is_not_served() {
    let app = setup_test_app();
    deploy_sample_site(&app, "Draft").await;

    let response = app
        .client()
        .patch(&api_path("/sites/0"))
        .add_header("Authorization", bearer())
        .json(&serde_json::json!({ "is_published": false }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app.client().get("/lp/0").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_missing_site_and_file() {
    let app = setup_test_app();
    deploy_sample_site(&app, "Public").await;

    assert_eq!(app.client().get("/lp/7").await.status_code(), 404);
    assert_eq!(
        app.client().get("/lp/0/img/missing.png").await.status_code(),
        404
    );
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = setup_test_app();

    let response = app.client().get("/health/live").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "alive");

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "not_configured");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = setup_test_app();

    let response = app
        .client()
        .get("/health/live")
        .add_header("x-request-id", "req-123")
        .await;
    assert_eq!(response.header("x-request-id"), "req-123");
}

#[tokio::test]
async fn test_non_numeric_site_number_is_json_bad_request() {
    let app = setup_test_app();

    let response = app.client().get("/lp/abc").await;
    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");

    let response = app.client().get("/lp/abc/css/style.css").await;
    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_injected_scripts_are_served() {
    let app = setup_test_app();
    deploy_sample_site(&app, "Scripts").await;

    let page = app.client().get("/lp/0").await.text();
    assert!(page.contains(r#"src="/lp/tracking.js""#));
    assert!(page.contains(r#"src="/lp/widget-loader.js""#));

    let response = app.client().get("/lp/tracking.js").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("content-type"),
        "application/javascript; charset=utf-8"
    );
    assert!(response.text().contains("/api/lp-tracking"));

    let response = app.client().get("/lp/widget-loader.js").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("data-lp-widget"));
}
