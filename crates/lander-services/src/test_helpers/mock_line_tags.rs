//! In-memory LINE tag and tracking stores

use async_trait::async_trait;
use chrono::Utc;
use lander_core::models::{
    ClientInfo, LineTag, NewLineTag, TrackingEvent, TrackingEventKind, UpdateLineTagRequest,
};
use lander_core::AppError;
use lander_db::{LineTagStore, TrackingStore};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// LINE tag store double with the same single-default and last-tag rules as
/// the Postgres repository
#[derive(Clone, Default)]
pub struct MemoryLineTagStore {
    tags: Arc<Mutex<Vec<LineTag>>>,
}

impl MemoryLineTagStore {
    pub fn tag_count(&self) -> usize {
        self.tags.lock().unwrap().len()
    }
}

fn sorted(tags: &[LineTag]) -> Vec<LineTag> {
    let mut tags = tags.to_vec();
    tags.sort_by_key(|tag| (tag.sort_order, tag.created_at));
    tags
}

fn new_tag(key: &str, label: &str, url: &str, sort_order: i32, is_default: bool) -> LineTag {
    let now = Utc::now();
    LineTag {
        id: Uuid::new_v4(),
        key: key.to_string(),
        label: label.to_string(),
        url: url.to_string(),
        sort_order,
        is_default,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl LineTagStore for MemoryLineTagStore {
    async fn list_tags(&self) -> Result<Vec<LineTag>, AppError> {
        Ok(sorted(&self.tags.lock().unwrap()))
    }

    async fn insert_tags(&self, tags: &[NewLineTag]) -> Result<(), AppError> {
        let mut state = self.tags.lock().unwrap();
        for tag in tags {
            let clashes = state
                .iter()
                .any(|t| t.key == tag.key || (tag.is_default && t.is_default));
            if !clashes {
                state.push(new_tag(
                    &tag.key,
                    &tag.label,
                    &tag.url,
                    tag.sort_order,
                    tag.is_default,
                ));
            }
        }
        Ok(())
    }

    async fn create_tag(&self, key: &str, label: &str, url: &str) -> Result<LineTag, AppError> {
        let mut state = self.tags.lock().unwrap();
        if state.iter().any(|t| t.key == key) {
            return Err(AppError::Conflict(format!(
                "LINE tag key {} is already in use",
                key
            )));
        }
        let sort_order = state.iter().map(|t| t.sort_order).max().unwrap_or(0) + 1;
        let tag = new_tag(key, label, url, sort_order, false);
        state.push(tag.clone());
        Ok(tag)
    }

    async fn update_tag(
        &self,
        id: Uuid,
        update: &UpdateLineTagRequest,
    ) -> Result<LineTag, AppError> {
        let mut state = self.tags.lock().unwrap();
        if !state.iter().any(|t| t.id == id) {
            return Err(AppError::NotFound(format!("LINE tag {} not found", id)));
        }
        if let Some(key) = &update.key {
            if state.iter().any(|t| t.id != id && &t.key == key) {
                return Err(AppError::Conflict(format!(
                    "LINE tag key {} is already in use",
                    key
                )));
            }
        }

        let make_default = update.is_default == Some(true);
        let now = Utc::now();
        for tag in state.iter_mut() {
            if tag.id == id {
                if let Some(key) = &update.key {
                    tag.key = key.clone();
                }
                if let Some(label) = &update.label {
                    tag.label = label.clone();
                }
                if let Some(url) = &update.url {
                    tag.url = url.clone();
                }
                tag.is_default |= make_default;
                tag.updated_at = now;
            } else if make_default {
                tag.is_default = false;
            }
        }

        state
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("LINE tag {} not found", id)))
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.tags.lock().unwrap();
        if state.len() <= 1 {
            return Err(AppError::InvalidInput(
                "The last LINE tag cannot be deleted".to_string(),
            ));
        }
        let index = state
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("LINE tag {} not found", id)))?;
        let removed = state.remove(index);

        if removed.is_default {
            let first = sorted(&state).first().map(|t| t.id);
            if let Some(tag) = state.iter_mut().find(|t| Some(t.id) == first) {
                tag.is_default = true;
            }
        }
        Ok(())
    }
}

/// Tracking store double that keeps every stored event in arrival order,
/// with engagement summaries replaced per session
#[derive(Clone, Default)]
pub struct MemoryTrackingStore {
    events: Arc<Mutex<Vec<(TrackingEvent, ClientInfo)>>>,
}

impl MemoryTrackingStore {
    pub fn events(&self) -> Vec<(TrackingEvent, ClientInfo)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingStore for MemoryTrackingStore {
    async fn record(&self, event: &TrackingEvent, client: &ClientInfo) -> Result<(), AppError> {
        let mut events = self.events.lock().unwrap();
        match event.kind {
            TrackingEventKind::Unknown => return Ok(()),
            TrackingEventKind::EngagementSummary { .. } => events.retain(|(e, _)| {
                !(e.session_id == event.session_id
                    && matches!(e.kind, TrackingEventKind::EngagementSummary { .. }))
            }),
            _ => {}
        }
        events.push((event.clone(), client.clone()));
        Ok(())
    }
}
