//! LINE tags: the registration URLs admins choose from for a site's CTA

use lander_core::models::{CreateLineTagRequest, LineTag, NewLineTag, UpdateLineTagRequest};
use lander_core::AppError;
use lander_db::LineTagStore;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

/// Tags seeded into an empty table: (key, label, url, is_default)
pub const DEFAULT_LINE_TAGS: &[(&str, &str, &str, bool)] = &[
    (
        "google",
        "Google広告",
        "https://liff.line.me/2009053059-UzfNXDJd/landing?follow=%40894ipobi&lp=4Ghdqp&liff_id=2009053059-UzfNXDJd",
        true,
    ),
    (
        "meta",
        "Meta広告",
        "https://liff.line.me/2009053059-UzfNXDJd/landing?follow=%40894ipobi&lp=GQbsFI&liff_id=2009053059-UzfNXDJd",
        false,
    ),
];

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9_]{1,50}$").unwrap_or_else(|e| panic!("invalid key pattern: {}", e))
});

fn check_key(key: &str) -> Result<(), AppError> {
    if KEY_PATTERN.is_match(key) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "Key may only contain lower-case letters, digits and underscores (1-50 characters)"
                .to_string(),
        ))
    }
}

fn check_url(url: &str) -> Result<(), AppError> {
    if url.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::InvalidInput("URL must start with https://".to_string()))
    }
}

#[derive(Clone)]
pub struct LineTagService {
    store: Arc<dyn LineTagStore>,
}

impl LineTagService {
    pub fn new(store: Arc<dyn LineTagStore>) -> Self {
        Self { store }
    }

    /// Tags in sort order, seeding the defaults into an empty table
    ///
    /// Concurrent first reads may both seed; the store skips the duplicates.
    pub async fn list_tags(&self) -> Result<Vec<LineTag>, AppError> {
        let tags = self.store.list_tags().await?;
        if !tags.is_empty() {
            return Ok(tags);
        }

        let defaults: Vec<NewLineTag> = DEFAULT_LINE_TAGS
            .iter()
            .zip(1..)
            .map(|(&(key, label, url, is_default), sort_order)| NewLineTag {
                key: key.to_string(),
                label: label.to_string(),
                url: url.to_string(),
                sort_order,
                is_default,
            })
            .collect();
        self.store.insert_tags(&defaults).await?;
        tracing::info!(count = defaults.len(), "Seeded default LINE tags");

        self.store.list_tags().await
    }

    #[tracing::instrument(skip(self, request), fields(key = %request.key))]
    pub async fn create_tag(&self, request: CreateLineTagRequest) -> Result<LineTag, AppError> {
        check_key(&request.key)?;
        check_url(&request.url)?;

        let tag = self
            .store
            .create_tag(&request.key, &request.label, &request.url)
            .await?;
        tracing::info!(key = %tag.key, sort_order = tag.sort_order, "LINE tag created");
        Ok(tag)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update_tag(
        &self,
        id: Uuid,
        request: UpdateLineTagRequest,
    ) -> Result<LineTag, AppError> {
        if let Some(key) = &request.key {
            check_key(key)?;
        }
        if let Some(url) = &request.url {
            check_url(url)?;
        }

        self.store.update_tag(id, &request).await
    }

    pub async fn delete_tag(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete_tag(id).await?;
        tracing::info!(tag_id = %id, "LINE tag deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MemoryLineTagStore;

    fn service() -> (LineTagService, Arc<MemoryLineTagStore>) {
        let store = Arc::new(MemoryLineTagStore::default());
        (LineTagService::new(store.clone()), store)
    }

    fn create(key: &str, url: &str) -> CreateLineTagRequest {
        CreateLineTagRequest {
            key: key.to_string(),
            label: "Label".to_string(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_seeds_defaults_once() {
        let (service, store) = service();

        let tags = service.list_tags().await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].key, "google");
        assert!(tags[0].is_default);
        assert_eq!(tags[1].key, "meta");
        assert!(!tags[1].is_default);

        service.list_tags().await.unwrap();
        assert_eq!(store.tag_count(), 2);
    }

    #[tokio::test]
    async fn test_key_and_url_rules() {
        let (service, _) = service();

        let long_key = "a".repeat(51);
        for key in ["Google", "with-dash", "", long_key.as_str()] {
            assert!(
                matches!(
                    service.create_tag(create(key, "https://liff.line.me/x")).await,
                    Err(AppError::InvalidInput(_))
                ),
                "{key}"
            );
        }
        assert!(matches!(
            service.create_tag(create("tiktok", "http://liff.line.me/x")).await,
            Err(AppError::InvalidInput(_))
        ));

        let tag = service
            .create_tag(create("tik_tok_2", "https://liff.line.me/x"))
            .await
            .unwrap();
        assert_eq!(tag.sort_order, 1);
        assert!(matches!(
            service.create_tag(create("tik_tok_2", "https://liff.line.me/y")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_moves_default() {
        let (service, _) = service();
        let tags = service.list_tags().await.unwrap();

        let meta = service
            .update_tag(
                tags[1].id,
                UpdateLineTagRequest {
                    is_default: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(meta.is_default);

        let tags = service.list_tags().await.unwrap();
        assert_eq!(tags.iter().filter(|t| t.is_default).count(), 1);
        assert!(!tags[0].is_default);

        let result = service
            .update_tag(
                tags[0].id,
                UpdateLineTagRequest {
                    url: Some("ftp://x".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_promotes_first_and_keeps_last() {
        let (service, _) = service();
        let tags = service.list_tags().await.unwrap();

        service.delete_tag(tags[0].id).await.unwrap();
        let remaining = service.list_tags().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].key, "meta");
        assert!(remaining[0].is_default);

        assert!(matches!(
            service.delete_tag(remaining[0].id).await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
