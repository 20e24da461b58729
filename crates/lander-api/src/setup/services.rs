//! Service wiring

use super::storage::Buckets;
use crate::state::AppState;
use lander_core::Config;
use lander_db::{
    CampaignCodeRepository, CampaignStore, LineTagRepository, SiteRepository, SiteStore,
    TrackingRepository,
};
use lander_services::{
    ArchivePipeline, CampaignService, LineTagService, PipelineOptions, SiteRegistry,
    TrackingService,
};
use sqlx::PgPool;
use std::sync::Arc;

pub fn initialize_services(config: &Config, pool: PgPool, buckets: Buckets) -> Arc<AppState> {
    let sites: Arc<dyn SiteStore> = Arc::new(SiteRepository::new(pool.clone()));
    let codes: Arc<dyn CampaignStore> = Arc::new(CampaignCodeRepository::new(pool.clone()));

    let registry = SiteRegistry::new(
        sites.clone(),
        codes.clone(),
        buckets.assets,
        config.max_html_size_bytes(),
    );
    let pipeline = ArchivePipeline::new(
        buckets.uploads,
        registry,
        PipelineOptions {
            batch_size: config.upload_batch_size(),
            max_archive_size_bytes: config.max_archive_size_bytes(),
        },
    );
    let campaigns = CampaignService::new(sites, codes);
    let line_tags = LineTagService::new(Arc::new(LineTagRepository::new(pool.clone())));
    let tracking = TrackingService::new(Arc::new(TrackingRepository::new(pool.clone())));

    tracing::info!(
        batch_size = config.upload_batch_size(),
        max_archive_mb = config.max_archive_size_bytes() / 1024 / 1024,
        "Services initialized"
    );

    Arc::new(AppState::new(
        pipeline,
        campaigns,
        line_tags,
        tracking,
        Some(pool),
    ))
}
