//! Lander Storage Library
//!
//! Object-storage abstraction for landing-page assets and temporary archive
//! uploads, with S3 (object_store) and local filesystem implementations.
//!
//! # Storage key format
//!
//! One storage instance is bound to one bucket. Keys inside a bucket are:
//!
//! - **Temporary archives** (uploads bucket): `lp-temp/{opaque}.zip`
//! - **Site assets** (assets bucket): `{site_number}/{path}`
//!
//! Keys must not contain `..` or a leading `/`. Key helpers live in the
//! `keys` module so every caller builds them the same way.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_storage, public_bucket_url};
pub use keys::{site_object_key, site_prefix, validate_temp_key};
pub use lander_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
