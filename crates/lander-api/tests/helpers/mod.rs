//! Test helpers: an in-memory application behind an axum-test server.
//!
//! Run with `cargo test -p lander-api`. No database or object store is
//! needed; the services run on the in-memory doubles from lander-services.

#![allow(dead_code)]

use axum_test::TestServer;
use lander_api::constants::API_PREFIX;
use lander_api::setup::routes::setup_routes;
use lander_api::state::AppState;
use lander_core::{BaseConfig, Config, LanderConfig, StorageBackend};
use lander_services::test_helpers::{
    MemoryCampaignStore, MemoryLineTagStore, MemorySiteStore, MemoryTrackingStore, MockStorage,
};
use lander_services::{
    ArchivePipeline, CampaignService, LineTagService, PipelineOptions, SiteRegistry,
    TrackingService,
};
use std::io::Write;
use std::sync::Arc;

pub const TEST_ADMIN_API_KEY: &str = "test-admin-key-0123456789abcdefghijklmnop";
pub const ASSETS_BASE_URL: &str = "https://cdn.test/lp-assets";

/// API path prefix for tests (e.g. `/api/v0/sites`)
pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub fn bearer() -> String {
    format!("Bearer {}", TEST_ADMIN_API_KEY)
}

pub struct TestApp {
    pub server: TestServer,
    pub uploads: MockStorage,
    pub assets: MockStorage,
    pub sites: Arc<MemorySiteStore>,
    pub codes: Arc<MemoryCampaignStore>,
    pub line_tags: Arc<MemoryLineTagStore>,
    pub tracking: Arc<MemoryTrackingStore>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Put an archive where an admin client would have uploaded it
    pub fn stage_archive(&self, temp_key: &str, files: &[(&str, &str)]) {
        self.uploads.insert(temp_key, build_zip(files));
    }
}

fn create_test_config() -> Config {
    Config(Box::new(LanderConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 5,
            admin_api_key: TEST_ADMIN_API_KEY.to_string(),
            environment: "test".to_string(),
        },
        database_url: "postgresql://localhost/lander_test".to_string(),
        storage_backend: Some(StorageBackend::Local),
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        uploads_bucket: "uploads".to_string(),
        assets_bucket: "lp-assets".to_string(),
        local_storage_path: Some("/tmp/lander-test".to_string()),
        local_storage_base_url: Some(ASSETS_BASE_URL.to_string()),
        public_storage_base_url: None,
        upload_batch_size: 2,
        max_archive_size_bytes: 1024 * 1024,
        max_html_size_bytes: 64 * 1024,
    }))
}

pub fn setup_test_app() -> TestApp {
    let config = create_test_config();

    let uploads = MockStorage::new("https://cdn.test/uploads");
    let assets = MockStorage::new(ASSETS_BASE_URL);
    let sites = Arc::new(MemorySiteStore::default());
    let codes = Arc::new(MemoryCampaignStore::default());

    let registry = SiteRegistry::new(
        sites.clone(),
        codes.clone(),
        Arc::new(assets.clone()),
        config.max_html_size_bytes(),
    );
    let pipeline = ArchivePipeline::new(
        Arc::new(uploads.clone()),
        registry,
        PipelineOptions {
            batch_size: config.upload_batch_size(),
            max_archive_size_bytes: config.max_archive_size_bytes(),
        },
    );
    let campaigns = CampaignService::new(sites.clone(), codes.clone());
    let line_tags = Arc::new(MemoryLineTagStore::default());
    let tracking = Arc::new(MemoryTrackingStore::default());
    let state = Arc::new(AppState::new(
        pipeline,
        campaigns,
        LineTagService::new(line_tags.clone()),
        TrackingService::new(tracking.clone()),
        None,
    ));

    let app = setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        uploads,
        assets,
        sites,
        codes,
        line_tags,
        tracking,
    }
}

pub fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in files {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .expect("start zip entry");
        writer.write_all(content.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

pub const SAMPLE_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Spring</title>
<link rel="stylesheet" href="css/style.css">
</head>
<body>
<img src="img/hero.png">
<footer>
<p>Spring Inc.</p>
</footer>
</body>
</html>"#;

/// Deploy the sample site through the API and return its site number
pub async fn deploy_sample_site(app: &TestApp, name: &str) -> i64 {
    app.stage_archive(
        "lp-temp/sample.zip",
        &[
            ("index.html", SAMPLE_INDEX),
            ("css/style.css", "body { background: url('../img/bg.png'); }"),
            ("img/hero.png", "png-bytes"),
        ],
    );

    let response = app
        .client()
        .post(&api_path("/sites/process"))
        .add_header("Authorization", bearer())
        .json(&serde_json::json!({ "temp_key": "lp-temp/sample.zip", "name": name }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    body["site_number"].as_i64().expect("site_number in response")
}
