//! HTML transforms applied to a site's entry document

pub mod inject;
mod patterns;
pub mod rewrite;
pub mod scan;

pub use inject::{inject_tags, Injected};
pub use rewrite::{normalize_path, rewrite_asset_paths};
pub use scan::{looks_like_document, scan_tags};
