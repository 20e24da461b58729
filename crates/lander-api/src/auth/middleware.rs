//! Bearer-token authentication for the admin API

use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lander_core::AppError;
use lander_services::AdminContext;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Subject recorded for callers holding the admin key
pub const ADMIN_SUBJECT: &str = "system-admin";

#[derive(Clone)]
pub struct AuthState {
    pub admin_api_key: String,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized(message: &str) -> Response {
    HttpAppError(AppError::Unauthorized(message.to_string())).into_response()
}

/// Reject requests without `Authorization: Bearer {ADMIN_API_KEY}`; on
/// success the request carries an `AdminContext` extension
pub async fn admin_auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return unauthorized("Missing Authorization header");
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        return unauthorized("Authorization header must use the Bearer scheme");
    };

    if !secure_compare(token.trim(), &auth_state.admin_api_key) {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request with invalid key");
        return unauthorized("Invalid API key");
    }

    request.extensions_mut().insert(AdminContext {
        subject: ADMIN_SUBJECT.to_string(),
    });

    next.run(request).await
}
