//! Site archives: reading uploaded ZIPs and exporting stored sites

pub mod export;
pub mod reader;

pub use export::export_site_archive;
pub use reader::{read_site_archive, ArchiveEntry, ArchiveError, SiteArchive};
