use lander_core::models::TagFlags;

use super::patterns::{ANALYTICS_TAG, CTA_MARKER, DOCUMENT_SHAPE, TRACKING_SCRIPT};

/// Report which tags a document already carries, without modifying it
pub fn scan_tags(html: &str) -> TagFlags {
    TagFlags {
        analytics_tag: ANALYTICS_TAG.is_match(html),
        tracking_script: TRACKING_SCRIPT.is_match(html),
        cta_marker: CTA_MARKER.is_match(html),
    }
}

/// Whether text still looks like an HTML document (has an `<html>` or
/// `<body>` opening tag)
pub fn looks_like_document(html: &str) -> bool {
    DOCUMENT_SHAPE.is_match(html)
}
