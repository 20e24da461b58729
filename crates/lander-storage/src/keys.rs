//! Shared key helpers for storage callers.
//!
//! Temporary archives live at `lp-temp/{opaque}.zip` in the uploads bucket;
//! site assets live at `{site_number}/{path}` in the assets bucket.

use crate::{StorageError, StorageResult};
use lander_core::constants::{TEMP_UPLOAD_PREFIX, TEMP_UPLOAD_SUFFIX};

/// Check that a temporary archive key has the `lp-temp/*.zip` shape and
/// cannot escape the temporary namespace.
pub fn validate_temp_key(key: &str) -> StorageResult<()> {
    let Some(rest) = key.strip_prefix(TEMP_UPLOAD_PREFIX) else {
        return Err(StorageError::InvalidKey(format!(
            "Temporary key must start with {}",
            TEMP_UPLOAD_PREFIX
        )));
    };

    if !rest.ends_with(TEMP_UPLOAD_SUFFIX) || rest.len() == TEMP_UPLOAD_SUFFIX.len() {
        return Err(StorageError::InvalidKey(format!(
            "Temporary key must name a {} file",
            TEMP_UPLOAD_SUFFIX
        )));
    }

    if key.contains("..") || key.contains('\\') || rest.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Temporary key contains invalid path segments".to_string(),
        ));
    }

    Ok(())
}

/// Storage prefix owning every object of a site: `{site_number}/`
pub fn site_prefix(site_number: i32) -> String {
    format!("{}/", site_number)
}

/// Storage key of one file of a site: `{site_number}/{path}`
pub fn site_object_key(site_number: i32, path: &str) -> String {
    format!("{}{}", site_prefix(site_number), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_temp_keys() {
        assert!(validate_temp_key("lp-temp/abc123.zip").is_ok());
        assert!(validate_temp_key("lp-temp/2024/upload-1.zip").is_ok());
    }

    #[test]
    fn test_invalid_temp_keys() {
        for key in [
            "uploads/abc.zip",
            "lp-temp/abc.tar",
            "lp-temp/.zip",
            "lp-temp/../secrets.zip",
            "lp-temp/a/../../b.zip",
            "lp-temp//etc.zip",
            "/lp-temp/abc.zip",
            "lp-temp\\abc.zip",
        ] {
            assert!(
                matches!(validate_temp_key(key), Err(StorageError::InvalidKey(_))),
                "{} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_site_keys() {
        assert_eq!(site_prefix(7), "7/");
        assert_eq!(site_object_key(7, "img/logo.png"), "7/img/logo.png");
        assert_eq!(site_object_key(0, "/index.html"), "0/index.html");
    }
}
