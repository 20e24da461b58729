//! Landing-page tracking beacons

use lander_core::models::{ClientInfo, TrackingEvent, TrackingEventKind};
use lander_core::AppError;
use lander_db::TrackingStore;
use std::sync::Arc;

const MAX_LP_ID_LEN: usize = 20;
const MAX_SESSION_ID_LEN: usize = 100;
const MAX_BUTTON_TEXT_CHARS: usize = 50;

#[derive(Clone)]
pub struct TrackingService {
    store: Arc<dyn TrackingStore>,
}

impl TrackingService {
    pub fn new(store: Arc<dyn TrackingStore>) -> Self {
        Self { store }
    }

    /// Store one beacon. Returns `false` for event types that are not kept.
    pub async fn record(
        &self,
        mut event: TrackingEvent,
        client: ClientInfo,
    ) -> Result<bool, AppError> {
        if event.lp_id.is_empty() || event.lp_id.len() > MAX_LP_ID_LEN {
            return Err(AppError::InvalidInput("Invalid lpId".to_string()));
        }
        if event.session_id.is_empty() || event.session_id.len() > MAX_SESSION_ID_LEN {
            return Err(AppError::InvalidInput("Invalid sessionId".to_string()));
        }
        if event.kind == TrackingEventKind::Unknown {
            tracing::debug!(lp_id = %event.lp_id, "Ignoring unknown tracking event type");
            return Ok(false);
        }

        if let TrackingEventKind::Click {
            button_text: Some(text),
            ..
        } = &mut event.kind
        {
            if text.chars().count() > MAX_BUTTON_TEXT_CHARS {
                *text = text.chars().take(MAX_BUTTON_TEXT_CHARS).collect();
            }
        }

        self.store.record(&event, &client).await?;
        tracing::debug!(
            event_type = event.kind.name(),
            lp_id = %event.lp_id,
            "Tracking event recorded"
        );
        Ok(true)
    }
}
