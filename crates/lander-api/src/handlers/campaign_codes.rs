//! Campaign code handlers

use crate::error::{HttpAppError, ValidatedJson, ValidatedPath};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use lander_core::models::{CreateCampaignCodeRequest, UpdateCampaignCodeRequest};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListCodesQuery {
    pub site_number: Option<i32>,
    pub genre_id: Option<i32>,
}

pub async fn list_codes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCodesQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let codes = state
        .campaigns
        .list_codes(query.site_number, query.genre_id)
        .await?;
    Ok(Json(codes))
}

pub async fn create_code(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateCampaignCodeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let code = state.campaigns.create_code(request).await?;
    Ok((StatusCode::CREATED, Json(code)))
}

pub async fn update_code(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateCampaignCodeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let code = state.campaigns.update_code(id, request).await?;
    Ok(Json(code))
}

pub async fn delete_code(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.campaigns.delete_code(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Unknown codes answer `{"valid": false}` with 200
pub async fn lookup_code(
    State(state): State<Arc<AppState>>,
    ValidatedPath(code): ValidatedPath<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let result = state.campaigns.lookup(&code).await?;
    Ok(Json(result))
}
