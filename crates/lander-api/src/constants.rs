pub use lander_core::constants::API_PREFIX;

/// Cache policy for HTML documents of a published site
pub const HTML_CACHE_CONTROL: &str = "public, max-age=60";

/// Cache policy for every other site asset
pub const ASSET_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Extra room on top of the HTML size limit for the JSON envelope of an
/// editor save
pub const BODY_LIMIT_HEADROOM_BYTES: usize = 1024 * 1024;

/// Cache policy for the tracking and widget-loader scripts
pub const SCRIPT_CACHE_CONTROL: &str = "public, max-age=300";
