//! Tracking beacon endpoint.

mod helpers;

use helpers::setup_test_app;
use lander_core::models::TrackingEventKind;

#[tokio::test]
async fn test_pageview_is_recorded_with_client_details() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/lp-tracking")
        .add_header("user-agent", "Mozilla/5.0 (iPhone)")
        .add_header("referer", "https://search.example/")
        .add_header("x-forwarded-for", "203.0.113.7, 10.0.0.2")
        .json(&serde_json::json!({
            "type": "pageview",
            "lpId": "3",
            "campaignCode": "AAA-0003-001",
            "sessionId": "sess_abc_1700000000000"
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let events = app.tracking.events();
    assert_eq!(events.len(), 1);
    let (event, client) = &events[0];
    assert_eq!(event.kind, TrackingEventKind::Pageview);
    assert_eq!(event.lp_id, "3");
    assert_eq!(event.campaign_code.as_deref(), Some("AAA-0003-001"));
    assert_eq!(client.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(client.user_agent.as_deref(), Some("Mozilla/5.0 (iPhone)"));
    assert_eq!(client.referrer.as_deref(), Some("https://search.example/"));
}

#[tokio::test]
async fn test_click_text_is_clipped() {
    let app = setup_test_app();
    let text = "L".repeat(80);

    let response = app
        .client()
        .post("/api/lp-tracking")
        .json(&serde_json::json!({
            "type": "click",
            "lpId": "0",
            "sessionId": "s1",
            "buttonId": "line_register",
            "buttonText": text
        }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let events = app.tracking.events();
    match &events[0].0.kind {
        TrackingEventKind::Click { button_text, .. } => {
            assert_eq!(button_text.as_deref().map(|t| t.chars().count()), Some(50));
        }
        other => panic!("expected click, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_beacon_reports_failure_without_error_status() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/lp-tracking")
        .text("{not json")
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);

    let response = app
        .client()
        .post("/api/lp-tracking")
        .json(&serde_json::json!({ "type": "pageview", "lpId": "", "sessionId": "s1" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);

    assert!(app.tracking.events().is_empty());
}

#[tokio::test]
async fn test_unknown_event_type_is_ignored() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/lp-tracking")
        .json(&serde_json::json!({ "type": "hover", "lpId": "0", "sessionId": "s1" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert!(app.tracking.events().is_empty());
}

#[tokio::test]
async fn test_engagement_summary_is_kept_once_per_session() {
    let app = setup_test_app();

    for depth in [50, 90] {
        let response = app
            .client()
            .post("/api/lp-tracking")
            .json(&serde_json::json!({
                "type": "engagement_summary",
                "lpId": "0",
                "sessionId": "s1",
                "maxScrollDepth": depth,
                "totalDwellTime": 12,
                "engagementLevel": 3,
                "ctaClicked": false
            }))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let events = app.tracking.events();
    assert_eq!(events.len(), 1);
    match &events[0].0.kind {
        TrackingEventKind::EngagementSummary {
            max_scroll_depth, ..
        } => assert_eq!(*max_scroll_depth, 90),
        other => panic!("expected engagement summary, got {:?}", other),
    }
}
