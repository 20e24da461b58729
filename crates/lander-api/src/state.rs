//! Application state shared by every handler

use lander_services::{
    ArchivePipeline, CampaignService, LineTagService, SiteRegistry, TrackingService,
};
use sqlx::PgPool;

pub struct AppState {
    pub pipeline: ArchivePipeline,
    pub registry: SiteRegistry,
    pub campaigns: CampaignService,
    pub line_tags: LineTagService,
    pub tracking: TrackingService,
    /// `None` when the services run on in-memory stores
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        pipeline: ArchivePipeline,
        campaigns: CampaignService,
        line_tags: LineTagService,
        tracking: TrackingService,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            registry: pipeline.registry().clone(),
            pipeline,
            campaigns,
            line_tags,
            tracking,
            pool,
        }
    }
}
