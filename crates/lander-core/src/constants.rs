//! Application-wide constants

/// Versioned prefix for all admin API routes
pub const API_PREFIX: &str = "/api/v0";

/// Prefix every temporary archive key must carry
pub const TEMP_UPLOAD_PREFIX: &str = "lp-temp/";

/// Suffix every temporary archive key must carry
pub const TEMP_UPLOAD_SUFFIX: &str = ".zip";

/// Number of concurrent single-file uploads per batch
pub const DEFAULT_UPLOAD_BATCH_SIZE: usize = 10;

/// Upper bound on explicitly listed sites for a tag rescan
pub const MAX_RESCAN_SITES: usize = 100;

/// Name of the entry document inside an uploaded archive
pub const INDEX_FILE_NAME: &str = "index.html";

/// Suffix appended to the name of a copied site
pub const COPY_NAME_SUFFIX: &str = " (copy)";
