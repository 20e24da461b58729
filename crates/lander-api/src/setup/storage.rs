//! Storage setup: one backend per bucket

use anyhow::{Context, Result};
use lander_core::Config;
use lander_storage::{create_storage, Storage};
use std::sync::Arc;

pub struct Buckets {
    /// Temporary `lp-temp/*.zip` uploads
    pub uploads: Arc<dyn Storage>,
    /// Published site files
    pub assets: Arc<dyn Storage>,
}

pub async fn setup_storage(config: &Config) -> Result<Buckets> {
    tracing::info!("Initializing storage buckets...");

    let uploads = create_storage(config, config.uploads_bucket())
        .await
        .context("Failed to initialize uploads bucket")?;
    let assets = create_storage(config, config.assets_bucket())
        .await
        .context("Failed to initialize assets bucket")?;

    tracing::info!(
        backend = %assets.backend_type(),
        uploads_bucket = %config.uploads_bucket(),
        assets_bucket = %config.assets_bucket(),
        assets_base_url = %assets.public_base_url(),
        "Storage initialized successfully"
    );

    Ok(Buckets { uploads, assets })
}
