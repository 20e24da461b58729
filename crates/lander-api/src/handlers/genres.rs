use crate::error::{HttpAppError, ValidatedJson, ValidatedPath};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use lander_core::models::GenreNameRequest;
use std::sync::Arc;
use validator::Validate;

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let genres = state.campaigns.list_genres().await?;
    Ok(Json(genres))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<GenreNameRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let genre = state.campaigns.create_genre(&request.name).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

pub async fn rename_genre(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<i32>,
    ValidatedJson(request): ValidatedJson<GenreNameRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let genre = state.campaigns.rename_genre(id, &request.name).await?;
    Ok(Json(genre))
}

pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.campaigns.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
