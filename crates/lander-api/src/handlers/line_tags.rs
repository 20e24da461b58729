use crate::error::{HttpAppError, ValidatedJson, ValidatedPath};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use lander_core::models::{CreateLineTagRequest, UpdateLineTagRequest};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Lists tags in display order, seeding the defaults on first use
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tags = state.line_tags.list_tags().await?;
    Ok(Json(tags))
}

pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateLineTagRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let tag = state.line_tags.create_tag(request).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateLineTagRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let tag = state.line_tags.update_tag(id, request).await?;
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.line_tags.delete_tag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
