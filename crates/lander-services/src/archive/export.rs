use lander_core::AppError;
use lander_storage::{site_prefix, Storage};
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Build a ZIP of every stored object of a site, with paths relative to the
/// site prefix
///
/// Objects that fail to download are logged and left out. A site with no
/// stored objects is `NotFound`.
#[tracing::instrument(skip(storage))]
pub async fn export_site_archive(
    storage: &dyn Storage,
    site_number: i32,
) -> Result<Vec<u8>, AppError> {
    let prefix = site_prefix(site_number);
    let keys = storage
        .list(&prefix)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    if keys.is_empty() {
        return Err(AppError::NotFound(format!(
            "Site {} has no stored files",
            site_number
        )));
    }

    let mut files = Vec::with_capacity(keys.len());
    for key in keys {
        match storage.download(&key).await {
            Ok(data) => {
                let relative = key[prefix.len()..].to_string();
                files.push((relative, data));
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Skipping file that failed to download");
            }
        }
    }

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (path, data) in &files {
            zip.start_file(path.as_str(), options)
                .map_err(|e| AppError::Internal(format!("Failed to add {} to ZIP: {}", path, e)))?;
            zip.write_all(data)?;
        }

        zip.finish()
            .map_err(|e| AppError::Internal(format!("Failed to finalize ZIP archive: {}", e)))?;
    }

    tracing::info!(
        site_number,
        files = files.len(),
        size_bytes = buffer.len(),
        "Site archive exported"
    );

    Ok(buffer)
}
