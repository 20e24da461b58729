//! LINE tag API integration tests.

mod helpers;

use helpers::{api_path, bearer, setup_test_app, TestApp};

async fn list(app: &TestApp) -> Vec<serde_json::Value> {
    let response = app
        .client()
        .get(&api_path("/line-tags"))
        .add_header("Authorization", bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

#[tokio::test]
async fn test_defaults_are_seeded_on_first_list() {
    let app = setup_test_app();

    let tags = list(&app).await;
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["key"], "google");
    assert_eq!(tags[0]["is_default"], true);
    assert_eq!(tags[1]["key"], "meta");
    assert_eq!(tags[1]["is_default"], false);

    // A second list does not seed again
    assert_eq!(list(&app).await.len(), 2);
    assert_eq!(app.line_tags.tag_count(), 2);
}

#[tokio::test]
async fn test_create_appends_after_existing_tags() {
    let app = setup_test_app();
    list(&app).await;

    let response = app
        .client()
        .post(&api_path("/line-tags"))
        .add_header("Authorization", bearer())
        .json(&serde_json::json!({
            "key": "tiktok",
            "label": "TikTok",
            "url": "https://liff.line.me/landing?lp=tt"
        }))
        .await;
    assert_eq!(response.status_code(), 201);
    let tag: serde_json::Value = response.json();
    assert_eq!(tag["is_default"], false);

    let tags = list(&app).await;
    assert_eq!(tags.last().map(|t| t["key"].clone()), Some("tiktok".into()));

    let response = app
        .client()
        .post(&api_path("/line-tags"))
        .add_header("Authorization", bearer())
        .json(&serde_json::json!({
            "key": "tiktok",
            "label": "TikTok again",
            "url": "https://liff.line.me/landing?lp=tt2"
        }))
        .await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_create_rejects_bad_key_and_plain_http_url() {
    let app = setup_test_app();

    for (key, url) in [
        ("Has Space", "https://liff.line.me/x"),
        ("ok_key", "http://liff.line.me/x"),
    ] {
        let response = app
            .client()
            .post(&api_path("/line-tags"))
            .add_header("Authorization", bearer())
            .json(&serde_json::json!({ "key": key, "label": "Label", "url": url }))
            .await;
        assert_eq!(response.status_code(), 400, "key={} url={}", key, url);
    }
}

#[tokio::test]
async fn test_making_a_tag_default_clears_the_previous_default() {
    let app = setup_test_app();
    let tags = list(&app).await;
    let meta_id = tags[1]["id"].as_str().expect("tag id").to_string();

    let response = app
        .client()
        .patch(&api_path(&format!("/line-tags/{}", meta_id)))
        .add_header("Authorization", bearer())
        .json(&serde_json::json!({ "is_default": true }))
        .await;
    assert_eq!(response.status_code(), 200);

    let tags = list(&app).await;
    let defaults: Vec<_> = tags.iter().filter(|t| t["is_default"] == true).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0]["key"], "meta");
}

#[tokio::test]
async fn test_last_tag_cannot_be_deleted() {
    let app = setup_test_app();
    let tags = list(&app).await;
    let google = tags[0]["id"].as_str().expect("tag id").to_string();
    let meta = tags[1]["id"].as_str().expect("tag id").to_string();

    let response = app
        .client()
        .delete(&api_path(&format!("/line-tags/{}", google)))
        .add_header("Authorization", bearer())
        .await;
    assert_eq!(response.status_code(), 204);

    // Deleting the default promotes the next tag
    let tags = list(&app).await;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["is_default"], true);

    let response = app
        .client()
        .delete(&api_path(&format!("/line-tags/{}", meta)))
        .add_header("Authorization", bearer())
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(app.line_tags.tag_count(), 1);
}

#[tokio::test]
async fn test_line_tag_routes_require_auth_and_uuid_ids() {
    let app = setup_test_app();

    let response = app.client().get(&api_path("/line-tags")).await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .delete(&api_path("/line-tags/not-a-uuid"))
        .add_header("Authorization", bearer())
        .await;
    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
}
