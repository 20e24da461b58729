//! Test helpers for service and HTTP tests
//!
//! In-memory doubles for the storage buckets and the site, campaign, LINE
//! tag and tracking stores, so the pipeline can run end to end without
//! Postgres or S3.

pub mod mock_line_tags;
pub mod mock_storage;
pub mod mock_stores;

pub use mock_line_tags::{MemoryLineTagStore, MemoryTrackingStore};
pub use mock_storage::MockStorage;
pub use mock_stores::{MemoryCampaignStore, MemorySiteStore};
