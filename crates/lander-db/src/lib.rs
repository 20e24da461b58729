//! Lander database layer
//!
//! Postgres repositories for sites, campaign codes, LINE tags and tracking
//! events, plus the store traits the services depend on so they can run
//! against in-memory doubles in tests.

pub mod db;

pub use db::{
    CampaignCodeRepository, CampaignStore, LineTagRepository, LineTagStore, SiteRepository,
    SiteStore, TrackingRepository, TrackingStore, TransactionGuard,
};
