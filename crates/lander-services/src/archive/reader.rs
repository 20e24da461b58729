//! Archive Reader
//!
//! Locates the shallowest `index.html` of an uploaded ZIP and re-roots every
//! other file entry relative to that document's directory.

use lander_core::constants::INDEX_FILE_NAME;
use std::io::{Cursor, Read};
use zip::ZipArchive;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive is not a readable ZIP file: {0}")]
    Unreadable(String),

    #[error("No index.html found in archive")]
    MissingIndex,
}

/// One non-index file of the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the root prefix (or the full entry path when the
    /// entry lies outside it)
    pub path: String,
    pub data: Vec<u8>,
}

/// Parsed contents of an uploaded site archive
#[derive(Debug, Clone)]
pub struct SiteArchive {
    /// Entry path of the chosen `index.html`
    pub index_path: String,
    /// Directory of `index_path` with a trailing `/`, or empty at the root
    pub root_prefix: String,
    pub index_html: String,
    pub entries: Vec<ArchiveEntry>,
}

fn is_index(path: &str) -> bool {
    path.rsplit('/').next() == Some(INDEX_FILE_NAME)
}

fn depth(path: &str) -> usize {
    path.split('/').count()
}

/// Entry names that could escape the site prefix once stored
fn is_unsafe_name(name: &str) -> bool {
    name.starts_with('/') || name.contains('\\') || name.split('/').any(|segment| segment == "..")
}

/// Read a ZIP buffer into a `SiteArchive`
pub fn read_site_archive(bytes: &[u8]) -> Result<SiteArchive, ArchiveError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveError::Unreadable(e.to_string()))?;

    let mut files: Vec<(String, Vec<u8>)> = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut file = zip
            .by_index(i)
            .map_err(|e| ArchiveError::Unreadable(e.to_string()))?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        if is_unsafe_name(&name) {
            tracing::warn!(entry = %name, "Skipping archive entry with unsafe path");
            continue;
        }

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| ArchiveError::Unreadable(format!("{}: {}", name, e)))?;
        files.push((name, data));
    }

    // Shallowest wins; the first one seen wins ties
    let index_pos = files
        .iter()
        .enumerate()
        .filter(|(_, (name, _))| is_index(name))
        .min_by_key(|(pos, (name, _))| (depth(name), *pos))
        .map(|(pos, _)| pos)
        .ok_or(ArchiveError::MissingIndex)?;

    let (index_path, index_bytes) = files.swap_remove(index_pos);
    let root_prefix = match index_path.rfind('/') {
        Some(idx) => index_path[..=idx].to_string(),
        None => String::new(),
    };

    let mut entries: Vec<ArchiveEntry> = files
        .into_iter()
        .map(|(name, data)| {
            let path = if !root_prefix.is_empty() && name.starts_with(&root_prefix) {
                name[root_prefix.len()..].to_string()
            } else {
                name
            };
            ArchiveEntry { path, data }
        })
        .collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        index_path = %index_path,
        root_prefix = %root_prefix,
        entries = entries.len(),
        "Archive read"
    );

    Ok(SiteArchive {
        index_html: String::from_utf8_lossy(&index_bytes).into_owned(),
        index_path,
        root_prefix,
        entries,
    })
}
