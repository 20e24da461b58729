//! Site Registry
//!
//! Site lifecycle operations that touch both the metadata rows and the
//! objects under a site's storage prefix. Storage and database steps are not
//! transactional with each other: storage cleanup failures are logged and the
//! metadata operation still proceeds.

use lander_core::constants::{COPY_NAME_SUFFIX, INDEX_FILE_NAME, MAX_RESCAN_SITES};
use lander_core::models::{
    LandingPage, NewCampaignCode, NewLandingPage, SaveHtmlResponse, SiteHtmlResponse,
    SortOrderEntry, TagCheckResult, TagFlags, UpdateSiteRequest,
};
use lander_core::AppError;
use lander_db::{CampaignStore, SiteStore};
use lander_storage::{site_object_key, site_prefix, Storage, StorageError};
use std::sync::Arc;
use std::time::Instant;

use crate::archive::export_site_archive;
use crate::campaign::generate_unique_code;
use crate::content_type::{content_type_for_path, HTML_CONTENT_TYPE};
use crate::html::{looks_like_document, scan_tags};

/// Site metadata plus the assets bucket it describes
#[derive(Clone)]
pub struct SiteRegistry {
    sites: Arc<dyn SiteStore>,
    codes: Arc<dyn CampaignStore>,
    assets: Arc<dyn Storage>,
    max_html_size_bytes: usize,
}

fn site_not_found(site_number: i32) -> AppError {
    AppError::NotFound(format!("Site {} not found", site_number))
}

fn index_key(site_number: i32) -> String {
    site_object_key(site_number, INDEX_FILE_NAME)
}

impl SiteRegistry {
    pub fn new(
        sites: Arc<dyn SiteStore>,
        codes: Arc<dyn CampaignStore>,
        assets: Arc<dyn Storage>,
        max_html_size_bytes: usize,
    ) -> Self {
        Self {
            sites,
            codes,
            assets,
            max_html_size_bytes,
        }
    }

    /// Bucket holding every site's files
    pub fn assets(&self) -> &dyn Storage {
        self.assets.as_ref()
    }

    pub async fn next_site_number(&self) -> Result<i32, AppError> {
        self.sites.next_site_number().await
    }

    pub async fn list_sites(&self) -> Result<Vec<LandingPage>, AppError> {
        self.sites.list_sites().await
    }

    pub async fn find_site(&self, site_number: i32) -> Result<Option<LandingPage>, AppError> {
        self.sites.get_site(site_number).await
    }

    pub async fn get_site(&self, site_number: i32) -> Result<LandingPage, AppError> {
        self.sites
            .get_site(site_number)
            .await?
            .ok_or_else(|| site_not_found(site_number))
    }

    /// Record a finished upload
    ///
    /// An overwrite of an existing row keeps every field not produced by the
    /// upload (CTA URL, visibility, sort order). Anything else inserts a new
    /// row at the end of the sort order.
    #[tracing::instrument(skip(self, flags))]
    pub async fn upsert_after_upload(
        &self,
        site_number: i32,
        name: &str,
        flags: TagFlags,
        is_overwrite: bool,
    ) -> Result<LandingPage, AppError> {
        if is_overwrite && self.sites.get_site(site_number).await?.is_some() {
            return self
                .sites
                .update_after_upload(site_number, name, flags)
                .await;
        }

        let sort_order = self.sites.next_sort_order().await?;
        self.sites
            .create_site(NewLandingPage {
                site_number,
                name: name.to_string(),
                flags,
                cta_url: None,
                sort_order,
            })
            .await
    }

    /// Remove every stored object of the site, then its row
    ///
    /// Storage failures are logged; the row is deleted regardless.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, site_number: i32) -> Result<(), AppError> {
        self.get_site(site_number).await?;

        let prefix = site_prefix(site_number);
        match self.assets.list(&prefix).await {
            Ok(keys) => {
                let mut failed = 0usize;
                for key in &keys {
                    if let Err(e) = self.assets.delete(key).await {
                        failed += 1;
                        tracing::warn!(error = %e, key = %key, "Failed to delete site file");
                    }
                }
                tracing::debug!(site_number, files = keys.len(), failed, "Site files removed");
            }
            Err(e) => {
                tracing::error!(error = %e, site_number, "Failed to list site files for deletion");
            }
        }

        if !self.sites.delete_site(site_number).await? {
            return Err(site_not_found(site_number));
        }

        tracing::info!(site_number, "Site deleted");
        Ok(())
    }

    /// Duplicate a site's files, metadata and active campaign codes under a
    /// freshly allocated site number
    #[tracing::instrument(skip(self))]
    pub async fn copy(&self, source_site_number: i32) -> Result<LandingPage, AppError> {
        let start = Instant::now();
        let source = self.get_site(source_site_number).await?;
        let target_site_number = self.sites.next_site_number().await?;

        let source_prefix = site_prefix(source_site_number);
        let keys = self.assets.list(&source_prefix).await?;
        let mut copied = 0usize;
        for key in &keys {
            let relative = &key[source_prefix.len()..];
            let target_key = site_object_key(target_site_number, relative);
            let result = match self.assets.download(key).await {
                Ok(data) => {
                    self.assets
                        .upload_with_key(&target_key, data, content_type_for_path(relative))
                        .await
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(_) => copied += 1,
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Failed to copy site file");
                }
            }
        }

        let sort_order = self.sites.next_sort_order().await?;
        let copy = self
            .sites
            .create_site(NewLandingPage {
                site_number: target_site_number,
                name: format!("{}{}", source.name, COPY_NAME_SUFFIX),
                flags: TagFlags {
                    analytics_tag: source.has_analytics_tag,
                    tracking_script: source.has_tracking_script,
                    cta_marker: source.has_cta_marker,
                },
                cta_url: source.cta_url.clone(),
                sort_order,
            })
            .await?;

        let codes = self.codes.list_active_codes_for_site(source.id).await?;
        for code in &codes {
            let new_code = generate_unique_code(self.codes.as_ref(), &code.genre_prefix).await?;
            self.codes
                .create_code(NewCampaignCode {
                    code: new_code,
                    site_id: copy.id,
                    genre_id: code.genre_id,
                    name: code.name.clone(),
                    memo: code.memo.clone(),
                    is_active: true,
                })
                .await?;
        }

        tracing::info!(
            source_site_number,
            site_number = target_site_number,
            files = keys.len(),
            copied,
            codes = codes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Site copied"
        );

        Ok(copy)
    }

    pub async fn set_hidden(&self, site_number: i32, hidden: bool) -> Result<LandingPage, AppError> {
        self.sites.set_hidden(site_number, hidden).await
    }

    pub async fn set_published(
        &self,
        site_number: i32,
        published: bool,
    ) -> Result<LandingPage, AppError> {
        self.sites.set_published(site_number, published).await
    }

    pub async fn update_name(&self, site_number: i32, name: &str) -> Result<LandingPage, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Site name is required".to_string()));
        }
        self.sites.update_name(site_number, name).await
    }

    /// Set or clear the CTA URL; a blank value clears it
    pub async fn update_cta_url(
        &self,
        site_number: i32,
        cta_url: Option<&str>,
    ) -> Result<LandingPage, AppError> {
        let cta_url = cta_url.map(str::trim).filter(|url| !url.is_empty());
        self.sites.update_cta_url(site_number, cta_url).await
    }

    /// Apply every field present in the request
    pub async fn update(
        &self,
        site_number: i32,
        request: UpdateSiteRequest,
    ) -> Result<LandingPage, AppError> {
        let mut site = self.get_site(site_number).await?;

        if let Some(name) = request.name.as_deref() {
            site = self.update_name(site_number, name).await?;
        }
        if let Some(cta_url) = request.cta_url.as_ref() {
            site = self.update_cta_url(site_number, cta_url.as_deref()).await?;
        }
        if let Some(hidden) = request.is_hidden {
            site = self.set_hidden(site_number, hidden).await?;
        }
        if let Some(published) = request.is_published {
            site = self.set_published(site_number, published).await?;
        }

        Ok(site)
    }

    pub async fn set_sort_orders(&self, entries: &[SortOrderEntry]) -> Result<(), AppError> {
        self.sites.set_sort_orders(entries).await
    }

    /// Re-detect tag presence from each site's stored `index.html`
    ///
    /// `None` rescans every site. Per-site failures are reported in the
    /// result list, not as an error.
    #[tracing::instrument(skip(self, site_numbers))]
    pub async fn rescan_tags(
        &self,
        site_numbers: Option<Vec<i32>>,
    ) -> Result<Vec<TagCheckResult>, AppError> {
        let targets: Vec<(i32, Option<LandingPage>)> = match site_numbers {
            Some(numbers) => {
                if numbers.len() > MAX_RESCAN_SITES {
                    return Err(AppError::InvalidInput(format!(
                        "At most {} sites can be checked at once",
                        MAX_RESCAN_SITES
                    )));
                }
                let mut targets = Vec::with_capacity(numbers.len());
                for n in numbers {
                    targets.push((n, self.sites.get_site(n).await?));
                }
                targets
            }
            None => self
                .sites
                .list_sites()
                .await?
                .into_iter()
                .map(|site| (site.site_number, Some(site)))
                .collect(),
        };

        let mut results = Vec::with_capacity(targets.len());
        for (site_number, site) in targets {
            let Some(site) = site else {
                results.push(TagCheckResult {
                    site_number,
                    name: String::new(),
                    checks: None,
                    error: Some("Site not found".to_string()),
                });
                continue;
            };
            results.push(self.rescan_site(site).await);
        }

        tracing::info!(
            sites = results.len(),
            failed = results.iter().filter(|r| r.error.is_some()).count(),
            "Tag rescan finished"
        );
        Ok(results)
    }

    async fn rescan_site(&self, site: LandingPage) -> TagCheckResult {
        let mut result = TagCheckResult {
            site_number: site.site_number,
            name: site.name,
            checks: None,
            error: None,
        };

        let html = match self.assets.download(&index_key(site.site_number)).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(error = %e, site_number = site.site_number, "Rescan could not read index.html");
                result.error = Some("HTML file missing".to_string());
                return result;
            }
        };

        let flags = scan_tags(&html);
        match self.sites.update_tag_flags(site.site_number, flags).await {
            Ok(_) => result.checks = Some(flags),
            Err(e) => {
                tracing::error!(error = %e, site_number = site.site_number, "Failed to store rescanned flags");
                result.error = Some("Failed to update tag flags".to_string());
            }
        }
        result
    }

    /// Stored entry document of a site
    pub async fn get_html(&self, site_number: i32) -> Result<SiteHtmlResponse, AppError> {
        let site = self.get_site(site_number).await?;
        let bytes = self
            .assets
            .download(&index_key(site_number))
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => AppError::NotFound("HTML file missing".to_string()),
                other => other.into(),
            })?;

        Ok(SiteHtmlResponse {
            site_number,
            name: site.name,
            html: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Store a hand-edited entry document verbatim and refresh the tag flags
    #[tracing::instrument(skip(self, html), fields(size_bytes = html.len()))]
    pub async fn save_html(&self, site_number: i32, html: String) -> Result<SaveHtmlResponse, AppError> {
        if html.len() > self.max_html_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "HTML exceeds the maximum size of {} bytes",
                self.max_html_size_bytes
            )));
        }
        if !looks_like_document(&html) {
            return Err(AppError::InvalidInput(
                "HTML must contain an <html> or <body> element".to_string(),
            ));
        }
        self.get_site(site_number).await?;

        let checks = scan_tags(&html);
        self.assets
            .upload_with_key(&index_key(site_number), html.into_bytes(), HTML_CONTENT_TYPE)
            .await?;

        let warning = match self.sites.update_tag_flags(site_number, checks).await {
            Ok(_) => None,
            Err(e) => {
                tracing::error!(error = %e, site_number, "HTML saved but tag flags were not updated");
                Some("HTML was saved but the tag flags could not be updated".to_string())
            }
        };

        tracing::info!(site_number, "Site HTML saved");
        Ok(SaveHtmlResponse {
            success: true,
            checks,
            warning,
        })
    }

    /// ZIP of every stored file of a site
    pub async fn export_site(&self, site_number: i32) -> Result<Vec<u8>, AppError> {
        self.get_site(site_number).await?;
        export_site_archive(self.assets.as_ref(), site_number).await
    }

    /// Bytes and content type of a published site's file; an empty path
    /// serves `index.html`
    pub async fn public_asset(
        &self,
        site_number: i32,
        path: &str,
    ) -> Result<(Vec<u8>, &'static str), AppError> {
        let site = self.get_site(site_number).await?;
        if !site.is_published {
            return Err(site_not_found(site_number));
        }

        let path = path.trim_start_matches('/');
        let path = if path.is_empty() { INDEX_FILE_NAME } else { path };
        if path.contains('\\') || path.split('/').any(|segment| segment == "..") {
            return Err(AppError::NotFound(format!("File not found: {}", path)));
        }

        let data = self
            .assets
            .download(&site_object_key(site_number, path))
            .await?;
        Ok((data, content_type_for_path(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MemoryCampaignStore, MemorySiteStore, MockStorage};

    struct Fixture {
        registry: SiteRegistry,
        sites: Arc<MemorySiteStore>,
        codes: Arc<MemoryCampaignStore>,
        assets: Arc<MockStorage>,
    }

    fn fixture() -> Fixture {
        let sites = Arc::new(MemorySiteStore::default());
        let codes = Arc::new(MemoryCampaignStore::default());
        let assets = Arc::new(MockStorage::new("https://cdn.test/lp-assets"));
        let registry = SiteRegistry::new(sites.clone(), codes.clone(), assets.clone(), 1024);
        Fixture {
            registry,
            sites,
            codes,
            assets,
        }
    }

    #[tokio::test]
    async fn test_next_site_number_is_monotonic_across_deletes() {
        let f = fixture();
        assert_eq!(f.registry.next_site_number().await.unwrap(), 0);

        f.registry
            .upsert_after_upload(0, "A", TagFlags::default(), false)
            .await
            .unwrap();
        f.registry
            .upsert_after_upload(1, "B", TagFlags::default(), false)
            .await
            .unwrap();
        assert_eq!(f.registry.next_site_number().await.unwrap(), 2);

        f.registry.delete(1).await.unwrap();
        assert_eq!(f.registry.next_site_number().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_overwrite_preserves_cta_url() {
        let f = fixture();
        f.sites.seed_site(4, "Old");
        f.registry
            .update_cta_url(4, Some("https://x.example/signup"))
            .await
            .unwrap();

        let flags = TagFlags {
            analytics_tag: true,
            tracking_script: true,
            cta_marker: true,
        };
        let site = f
            .registry
            .upsert_after_upload(4, "New", flags, true)
            .await
            .unwrap();

        assert_eq!(site.name, "New");
        assert!(site.has_cta_marker);
        assert_eq!(site.cta_url.as_deref(), Some("https://x.example/signup"));
    }

    #[tokio::test]
    async fn test_delete_removes_files_even_when_some_fail() {
        let f = fixture();
        f.sites.seed_site(2, "A");
        f.assets.insert("2/index.html", b"x".to_vec());
        f.assets.insert("2/a.css", b"y".to_vec());
        f.assets.insert("20/index.html", b"z".to_vec());
        f.assets.fail_deletes();

        f.registry.delete(2).await.unwrap();

        assert!(f.registry.find_site(2).await.unwrap().is_none());
        assert!(f.assets.get("20/index.html").is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_site() {
        let f = fixture();
        assert!(matches!(
            f.registry.delete(8).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_copy_duplicates_files_metadata_and_active_codes() {
        let f = fixture();
        let source = f.sites.seed_site(0, "Spring");
        f.registry
            .update_cta_url(0, Some("https://x.example/signup"))
            .await
            .unwrap();
        f.assets.insert("0/index.html", b"<html></html>".to_vec());
        f.assets.insert("0/img/logo.png", b"png".to_vec());

        let genre = f.codes.seed_genre("AAA", "LINE");
        let active = f.codes.seed_code("AAA-ABC123", source.id, &genre, true);
        f.codes.seed_code("AAA-OFF000", source.id, &genre, false);

        let copy = f.registry.copy(0).await.unwrap();

        assert_eq!(copy.site_number, 1);
        assert_eq!(copy.name, "Spring (copy)");
        assert_eq!(copy.cta_url.as_deref(), Some("https://x.example/signup"));
        assert_eq!(f.assets.get("1/img/logo.png").as_deref(), Some(&b"png"[..]));
        assert_eq!(f.assets.content_type("1/img/logo.png").as_deref(), Some("image/png"));

        let copied = f.codes.codes_for_site(copy.id);
        assert_eq!(copied.len(), 1);
        assert!(copied[0].code.starts_with("AAA-"));
        assert_ne!(copied[0].code, active.code);
        assert_eq!(copied[0].name, active.name);

        let original = f.codes.codes_for_site(source.id);
        assert_eq!(original.len(), 2);
        assert!(original.iter().any(|c| c.code == "AAA-ABC123"));
    }

    #[tokio::test]
    async fn test_copy_continues_past_failed_files() {
        let f = fixture();
        f.sites.seed_site(0, "A");
        f.assets.insert("0/index.html", b"x".to_vec());
        f.assets.insert("0/a.css", b"y".to_vec());
        f.assets.fail_uploads_for("1/a.css");

        let copy = f.registry.copy(0).await.unwrap();
        assert_eq!(copy.site_number, 1);
        assert!(f.assets.get("1/index.html").is_some());
        assert!(f.assets.get("1/a.css").is_none());
    }

    #[tokio::test]
    async fn test_update_applies_present_fields() {
        let f = fixture();
        f.sites.seed_site(3, "A");

        let site = f
            .registry
            .update(
                3,
                UpdateSiteRequest {
                    name: Some("Renamed".into()),
                    cta_url: Some(Some("https://x.example".into())),
                    is_hidden: Some(true),
                    is_published: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(site.name, "Renamed");
        assert!(site.is_hidden);
        assert!(site.is_published);

        let site = f
            .registry
            .update(
                3,
                UpdateSiteRequest {
                    cta_url: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(site.cta_url, None);
    }

    #[tokio::test]
    async fn test_rescan_reports_missing_html() {
        let f = fixture();
        f.sites.seed_site(0, "With HTML");
        f.sites.seed_site(1, "Without HTML");
        f.assets.insert(
            "0/index.html",
            br#"<html><body><script src="/lp/tracking.js"></script></body></html>"#.to_vec(),
        );

        let results = f.registry.rescan_tags(None).await.unwrap();
        assert_eq!(results.len(), 2);

        let first = results.iter().find(|r| r.site_number == 0).unwrap();
        let checks = first.checks.unwrap();
        assert!(checks.tracking_script);
        assert!(!checks.analytics_tag);
        assert!(f.registry.get_site(0).await.unwrap().has_tracking_script);

        let second = results.iter().find(|r| r.site_number == 1).unwrap();
        assert_eq!(second.error.as_deref(), Some("HTML file missing"));
    }

    #[tokio::test]
    async fn test_rescan_limit() {
        let f = fixture();
        let numbers: Vec<i32> = (0..=MAX_RESCAN_SITES as i32).collect();
        assert!(matches!(
            f.registry.rescan_tags(Some(numbers)).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_save_html_stores_verbatim_and_rescans() {
        let f = fixture();
        f.sites.seed_site(5, "A");
        let html = "<html><body><a data-cats=\"lineFriendsFollowLink\" href=\"x\">go</a></body></html>";

        let saved = f.registry.save_html(5, html.to_string()).await.unwrap();
        assert!(saved.success);
        assert!(saved.checks.cta_marker);
        assert!(!saved.checks.analytics_tag);
        assert!(saved.warning.is_none());

        let stored = f.registry.get_html(5).await.unwrap();
        assert_eq!(stored.html, html);
        assert!(f.registry.get_site(5).await.unwrap().has_cta_marker);
    }

    #[tokio::test]
    async fn test_save_html_validation() {
        let f = fixture();
        f.sites.seed_site(5, "A");

        assert!(matches!(
            f.registry.save_html(5, "plain text".into()).await,
            Err(AppError::InvalidInput(_))
        ));
        let oversized = format!("<html>{}</html>", "x".repeat(2048));
        assert!(matches!(
            f.registry.save_html(5, oversized).await,
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_public_asset_respects_publish_flag() {
        let f = fixture();
        f.sites.seed_site(6, "A");
        f.assets.insert("6/index.html", b"<html></html>".to_vec());
        f.assets.insert("6/css/a.css", b"body{}".to_vec());

        let (body, content_type) = f.registry.public_asset(6, "").await.unwrap();
        assert_eq!(body, b"<html></html>");
        assert_eq!(content_type, HTML_CONTENT_TYPE);

        let (_, content_type) = f.registry.public_asset(6, "css/a.css").await.unwrap();
        assert_eq!(content_type, "text/css; charset=utf-8");

        assert!(matches!(
            f.registry.public_asset(6, "../7/index.html").await,
            Err(AppError::NotFound(_))
        ));

        f.registry.set_published(6, false).await.unwrap();
        assert!(matches!(
            f.registry.public_asset(6, "").await,
            Err(AppError::NotFound(_))
        ));
    }
}
