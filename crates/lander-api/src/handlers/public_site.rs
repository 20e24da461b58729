//! Public delivery of published sites (no authentication)

use crate::constants::{ASSET_CACHE_CONTROL, HTML_CACHE_CONTROL};
use crate::error::{HttpAppError, ValidatedPath};
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use lander_services::content_type::HTML_CONTENT_TYPE;
use std::sync::Arc;

async fn serve(state: &AppState, site_number: i32, path: &str) -> Result<Response, HttpAppError> {
    let (data, content_type) = state.registry.public_asset(site_number, path).await?;
    let cache_control = if content_type == HTML_CONTENT_TYPE {
        HTML_CACHE_CONTROL
    } else {
        ASSET_CACHE_CONTROL
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        data,
    )
        .into_response())
}

/// `GET /lp/{n}` serves the site's `index.html`
pub async fn serve_site_index(
    State(state): State<Arc<AppState>>,
    ValidatedPath(site_number): ValidatedPath<i32>,
) -> Result<Response, HttpAppError> {
    serve(&state, site_number, "").await
}

pub async fn serve_site_file(
    State(state): State<Arc<AppState>>,
    ValidatedPath((site_number, path)): ValidatedPath<(i32, String)>,
) -> Result<Response, HttpAppError> {
    serve(&state, site_number, &path).await
}
