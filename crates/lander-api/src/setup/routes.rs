//! Route configuration and setup

use crate::auth::{admin_auth_middleware, AuthState};
use crate::constants::{API_PREFIX, BODY_LIMIT_HEADROOM_BYTES};
use crate::handlers::{campaign_codes, genres, health, line_tags, public_site, sites, tracking};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use lander_core::Config;
use lander_infra::request_id_middleware;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        admin_api_key: config.admin_api_key().to_string(),
    });

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        auth_state,
        admin_auth_middleware,
    ));

    let body_limit = config.max_html_size_bytes() + BODY_LIMIT_HEADROOM_BYTES;

    // Server-level concurrency limit against resource exhaustion
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(http_concurrency_limit, "HTTP concurrency limit layer enabled");

    let app = public_routes()
        .merge(protected_routes)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/lp/tracking.js", get(tracking::tracking_script))
        .route("/lp/widget-loader.js", get(tracking::widget_loader_script))
        .route("/api/lp-tracking", post(tracking::record_event))
        .route("/lp/{site_number}", get(public_site::serve_site_index))
        .route("/lp/{site_number}/{*path}", get(public_site::serve_site_file))
}

/// Everything under the API prefix; the caller layers authentication on top
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/sites", API_PREFIX),
            get(sites::list_sites),
        )
        .route(
            &format!("{}/sites/process", API_PREFIX),
            post(sites::process_archive),
        )
        .route(
            &format!("{}/sites/order", API_PREFIX),
            put(sites::set_sort_orders),
        )
        .route(
            &format!("{}/sites/check-tags", API_PREFIX),
            post(sites::check_tags),
        )
        .route(
            &format!("{}/sites/{{site_number}}", API_PREFIX),
            get(sites::get_site)
                .patch(sites::update_site)
                .delete(sites::delete_site),
        )
        .route(
            &format!("{}/sites/{{site_number}}/copy", API_PREFIX),
            post(sites::copy_site),
        )
        .route(
            &format!("{}/sites/{{site_number}}/html", API_PREFIX),
            get(sites::get_site_html).put(sites::save_site_html),
        )
        .route(
            &format!("{}/sites/{{site_number}}/download", API_PREFIX),
            get(sites::download_site),
        )
        .route(
            &format!("{}/campaign-codes", API_PREFIX),
            get(campaign_codes::list_codes).post(campaign_codes::create_code),
        )
        .route(
            &format!("{}/campaign-codes/lookup/{{code}}", API_PREFIX),
            get(campaign_codes::lookup_code),
        )
        .route(
            &format!("{}/campaign-codes/{{id}}", API_PREFIX),
            patch(campaign_codes::update_code).delete(campaign_codes::delete_code),
        )
        .route(
            &format!("{}/code-genres", API_PREFIX),
            get(genres::list_genres).post(genres::create_genre),
        )
        .route(
            &format!("{}/code-genres/{{id}}", API_PREFIX),
            patch(genres::rename_genre).delete(genres::delete_genre),
        )
        .route(
            &format!("{}/line-tags", API_PREFIX),
            get(line_tags::list_tags).post(line_tags::create_tag),
        )
        .route(
            &format!("{}/line-tags/{{id}}", API_PREFIX),
            patch(line_tags::update_tag).delete(line_tags::delete_tag),
        )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
