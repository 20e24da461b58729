//! Tracking scripts and the beacon endpoint (no authentication)

use crate::constants::SCRIPT_CACHE_CONTROL;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use lander_core::models::{ClientInfo, TrackingAck, TrackingEvent};
use lander_services::content_type::content_type_for_extension;
use std::sync::Arc;

const TRACKING_SCRIPT: &str = include_str!("../../assets/tracking.js");
const WIDGET_LOADER_SCRIPT: &str = include_str!("../../assets/widget-loader.js");

fn script(body: &'static str) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, content_type_for_extension("js")),
            (header::CACHE_CONTROL, SCRIPT_CACHE_CONTROL),
        ],
        body,
    )
}

/// `GET /lp/tracking.js`
pub async fn tracking_script() -> impl IntoResponse {
    script(TRACKING_SCRIPT)
}

/// `GET /lp/widget-loader.js`
pub async fn widget_loader_script() -> impl IntoResponse {
    script(WIDGET_LOADER_SCRIPT)
}

fn header_str(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    // First hop of X-Forwarded-For is the visitor
    let ip_address = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"));

    ClientInfo {
        user_agent: header_str(headers, header::USER_AGENT),
        referrer: header_str(headers, header::REFERER),
        ip_address,
    }
}

/// `POST /api/lp-tracking`
///
/// Beacons are fire-and-forget, so the response is always 200 and failures
/// only flip `success` to `false`.
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<TrackingEvent>, JsonRejection>,
) -> Json<TrackingAck> {
    let event = match payload {
        Ok(Json(event)) => event,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected tracking payload");
            return Json(TrackingAck { success: false });
        }
    };

    let success = match state.tracking.record(event, client_info(&headers)).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to record tracking event");
            false
        }
    };
    Json(TrackingAck { success })
}
