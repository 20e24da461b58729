//! Admin site handlers: archive deployment and registry operations

use crate::error::{HttpAppError, ValidatedJson, ValidatedPath};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use lander_core::models::{
    CheckTagsRequest, ProcessArchiveRequest, SaveHtmlRequest, SetSortOrdersRequest,
    TagCheckResult, UpdateSiteRequest,
};
use lander_services::AdminContext;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct CheckTagsResponse {
    pub results: Vec<TagCheckResult>,
}

/// Deploy an uploaded archive; the caller is the admin set by the auth middleware
#[tracing::instrument(skip(state, admin, request), fields(operation = "process_archive", subject = %admin.subject))]
pub async fn process_archive(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminContext>,
    ValidatedJson(request): ValidatedJson<ProcessArchiveRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state
        .pipeline
        .process_archive(Some(&admin), request)
        .await?;
    Ok(Json(response))
}

pub async fn list_sites(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let sites = state.registry.list_sites().await?;
    Ok(Json(sites))
}

pub async fn get_site(
    State(state): State<Arc<AppState>>,
    ValidatedPath(site_number): ValidatedPath<i32>,
) -> Result<impl IntoResponse, HttpAppError> {
    let site = state.registry.get_site(site_number).await?;
    Ok(Json(site))
}

#[tracing::instrument(skip(state, request), fields(operation = "update_site"))]
pub async fn update_site(
    State(state): State<Arc<AppState>>,
    ValidatedPath(site_number): ValidatedPath<i32>,
    ValidatedJson(request): ValidatedJson<UpdateSiteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let site = state.registry.update(site_number, request).await?;
    Ok(Json(site))
}

#[tracing::instrument(skip(state), fields(operation = "delete_site"))]
pub async fn delete_site(
    State(state): State<Arc<AppState>>,
    ValidatedPath(site_number): ValidatedPath<i32>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.registry.delete(site_number).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state), fields(operation = "copy_site"))]
pub async fn copy_site(
    State(state): State<Arc<AppState>>,
    ValidatedPath(site_number): ValidatedPath<i32>,
) -> Result<impl IntoResponse, HttpAppError> {
    let copy = state.registry.copy(site_number).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

pub async fn set_sort_orders(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SetSortOrdersRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.registry.set_sort_orders(&request.entries).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, request), fields(operation = "check_tags"))]
pub async fn check_tags(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CheckTagsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let results = state.registry.rescan_tags(request.site_numbers).await?;
    Ok(Json(CheckTagsResponse { results }))
}

pub async fn get_site_html(
    State(state): State<Arc<AppState>>,
    ValidatedPath(site_number): ValidatedPath<i32>,
) -> Result<impl IntoResponse, HttpAppError> {
    let html = state.registry.get_html(site_number).await?;
    Ok(Json(html))
}

#[tracing::instrument(skip(state, request), fields(operation = "save_site_html"))]
pub async fn save_site_html(
    State(state): State<Arc<AppState>>,
    ValidatedPath(site_number): ValidatedPath<i32>,
    ValidatedJson(request): ValidatedJson<SaveHtmlRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.registry.save_html(site_number, request.html).await?;
    Ok(Json(response))
}

/// ZIP of every stored file of the site
#[tracing::instrument(skip(state), fields(operation = "download_site"))]
pub async fn download_site(
    State(state): State<Arc<AppState>>,
    ValidatedPath(site_number): ValidatedPath<i32>,
) -> Result<impl IntoResponse, HttpAppError> {
    let archive = state.registry.export_site(site_number).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"site-{}.zip\"", site_number),
        ),
    ];
    Ok((headers, archive))
}
