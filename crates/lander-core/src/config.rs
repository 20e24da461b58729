//! Configuration module
//!
//! Configuration for the API server and the archive pipeline: database,
//! storage buckets, admin authentication and pipeline limits.

use std::env;

use crate::constants::DEFAULT_UPLOAD_BATCH_SIZE;
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_ARCHIVE_SIZE_MB: usize = 50;
const MAX_HTML_SIZE_MB: usize = 5;
const MIN_ADMIN_API_KEY_LEN: usize = 32;

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub admin_api_key: String,
    pub environment: String,
}

/// Landing-page service configuration
#[derive(Clone, Debug)]
pub struct LanderConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub aws_region: Option<String>,
    pub uploads_bucket: String,
    pub assets_bucket: String,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub public_storage_base_url: Option<String>,
    // Pipeline configuration
    pub upload_batch_size: usize,
    pub max_archive_size_bytes: usize,
    pub max_html_size_bytes: usize,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config(pub Box<LanderConfig>);

impl Config {
    fn inner(&self) -> &LanderConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = LanderConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn admin_api_key(&self) -> &str {
        &self.inner().base.admin_api_key
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn uploads_bucket(&self) -> &str {
        &self.inner().uploads_bucket
    }

    pub fn assets_bucket(&self) -> &str {
        &self.inner().assets_bucket
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn public_storage_base_url(&self) -> Option<&str> {
        self.inner().public_storage_base_url.as_deref()
    }

    pub fn upload_batch_size(&self) -> usize {
        self.inner().upload_batch_size
    }

    pub fn max_archive_size_bytes(&self) -> usize {
        self.inner().max_archive_size_bytes
    }

    pub fn max_html_size_bytes(&self) -> usize {
        self.inner().max_html_size_bytes
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

impl LanderConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            admin_api_key: env::var("ADMIN_API_KEY")
                .map_err(|_| anyhow::anyhow!("ADMIN_API_KEY must be set for authentication"))?,
            environment,
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| s.parse::<StorageBackend>().ok());

        let config = LanderConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            uploads_bucket: env::var("UPLOADS_BUCKET").unwrap_or_else(|_| "uploads".to_string()),
            assets_bucket: env::var("ASSETS_BUCKET").unwrap_or_else(|_| "lp-assets".to_string()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            public_storage_base_url: env::var("PUBLIC_STORAGE_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            upload_batch_size: env::var("UPLOAD_BATCH_SIZE")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_BATCH_SIZE.to_string())
                .parse()
                .unwrap_or(DEFAULT_UPLOAD_BATCH_SIZE),
            max_archive_size_bytes: env::var("MAX_ARCHIVE_SIZE_MB")
                .unwrap_or_else(|_| MAX_ARCHIVE_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_ARCHIVE_SIZE_MB)
                * 1024
                * 1024,
            max_html_size_bytes: env::var("MAX_HTML_SIZE_MB")
                .unwrap_or_else(|_| MAX_HTML_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_HTML_SIZE_MB)
                * 1024
                * 1024,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.admin_api_key.len() < MIN_ADMIN_API_KEY_LEN {
            return Err(anyhow::anyhow!(
                "ADMIN_API_KEY must be at least {} characters long",
                MIN_ADMIN_API_KEY_LEN
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.upload_batch_size == 0 {
            return Err(anyhow::anyhow!("UPLOAD_BATCH_SIZE must be greater than 0"));
        }

        if self.uploads_bucket.is_empty() || self.assets_bucket.is_empty() {
            return Err(anyhow::anyhow!(
                "UPLOADS_BUCKET and ASSETS_BUCKET must not be empty"
            ));
        }

        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
