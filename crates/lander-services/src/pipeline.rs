//! Archive pipeline
//!
//! `process_archive` turns a temporary ZIP upload into a deployed site:
//! read the archive, inject tags into its `index.html`, rewrite relative
//! asset paths, upload every file in batches and record the site row. The
//! temporary object is deleted on every exit once its key has been
//! validated; a cleanup failure is only logged.

use lander_core::constants::{DEFAULT_UPLOAD_BATCH_SIZE, INDEX_FILE_NAME};
use lander_core::models::{ProcessArchiveRequest, ProcessArchiveResponse};
use lander_storage::{site_object_key, validate_temp_key, Storage};
use std::sync::Arc;
use std::time::Instant;

use crate::archive::read_site_archive;
use crate::content_type::{content_type_for_path, HTML_CONTENT_TYPE};
use crate::error::PipelineError;
use crate::html::{inject_tags, rewrite_asset_paths};
use crate::registry::SiteRegistry;
use crate::upload::{upload_in_batches, UploadTask};

/// Authenticated site administrator making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    pub subject: String,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub batch_size: usize,
    pub max_archive_size_bytes: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_UPLOAD_BATCH_SIZE,
            max_archive_size_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Clone)]
pub struct ArchivePipeline {
    /// Bucket holding the temporary `lp-temp/*.zip` uploads
    uploads: Arc<dyn Storage>,
    registry: SiteRegistry,
    options: PipelineOptions,
}

impl ArchivePipeline {
    pub fn new(uploads: Arc<dyn Storage>, registry: SiteRegistry, options: PipelineOptions) -> Self {
        Self {
            uploads,
            registry,
            options,
        }
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Deploy the archive at `request.temp_key`
    ///
    /// A `warning` on the response means some files failed to upload; the
    /// site row is still written.
    #[tracing::instrument(
        skip(self, caller, request),
        fields(temp_key = %request.temp_key, site_number = ?request.site_number)
    )]
    pub async fn process_archive(
        &self,
        caller: Option<&AdminContext>,
        request: ProcessArchiveRequest,
    ) -> Result<ProcessArchiveResponse, PipelineError> {
        let Some(admin) = caller else {
            return Err(PipelineError::Authorization);
        };
        validate_temp_key(&request.temp_key)
            .map_err(|e| PipelineError::Validation(e.to_string()))?;

        let start = Instant::now();
        let result = self.run(&request).await;

        if let Err(e) = self.uploads.delete(&request.temp_key).await {
            tracing::warn!(error = %e, key = %request.temp_key, "Failed to delete temporary archive");
        }

        match &result {
            Ok(response) => tracing::info!(
                admin = %admin.subject,
                site_number = response.site_number,
                warning = response.warning.as_deref().unwrap_or(""),
                duration_ms = start.elapsed().as_millis() as u64,
                "Archive deployed"
            ),
            Err(e) => tracing::warn!(
                admin = %admin.subject,
                error = %e,
                kind = e.kind(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Archive deployment failed"
            ),
        }

        result
    }

    async fn run(
        &self,
        request: &ProcessArchiveRequest,
    ) -> Result<ProcessArchiveResponse, PipelineError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(PipelineError::Validation("Site name is required".to_string()));
        }

        let bytes = self
            .uploads
            .download(&request.temp_key)
            .await
            .map_err(PipelineError::Download)?;
        if bytes.len() > self.options.max_archive_size_bytes {
            return Err(PipelineError::Validation(format!(
                "Archive is {} bytes; the limit is {} bytes",
                bytes.len(),
                self.options.max_archive_size_bytes
            )));
        }

        let archive =
            read_site_archive(&bytes).map_err(|e| PipelineError::ArchiveStructure(e.to_string()))?;

        let (site_number, prior_cta_url, is_overwrite) = match request.site_number {
            Some(n) if n < 0 => {
                return Err(PipelineError::Validation(format!(
                    "Invalid site number: {}",
                    n
                )))
            }
            Some(n) => {
                let existing = self.registry.find_site(n).await?;
                (n, existing.and_then(|site| site.cta_url), true)
            }
            None => (self.registry.next_site_number().await?, None, false),
        };

        let assets = self.registry.assets();
        let injected = inject_tags(&archive.index_html, prior_cta_url.as_deref());
        let html = rewrite_asset_paths(&injected.html, site_number, &assets.public_base_url());

        let mut tasks = Vec::with_capacity(archive.entries.len() + 1);
        tasks.push(UploadTask {
            key: site_object_key(site_number, INDEX_FILE_NAME),
            data: html.into_bytes(),
            content_type: HTML_CONTENT_TYPE,
        });
        tasks.extend(archive.entries.into_iter().map(|entry| UploadTask {
            key: site_object_key(site_number, &entry.path),
            content_type: content_type_for_path(&entry.path),
            data: entry.data,
        }));

        let report = upload_in_batches(assets, tasks, self.options.batch_size).await;

        self.registry
            .upsert_after_upload(site_number, name, injected.flags, is_overwrite)
            .await?;

        Ok(ProcessArchiveResponse {
            success: true,
            site_number,
            warning: report.warning().map(|w| w.to_string()),
        })
    }
}
