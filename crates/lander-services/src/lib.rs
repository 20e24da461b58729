//! Lander Services Layer
//!
//! Business logic for landing-page deployment: the archive pipeline
//! (read, inject, rewrite, upload, register), the site registry operations
//! built on the same storage namespace, campaign code and LINE tag
//! management, and recording of tracking beacons. The API crate stays a
//! thin HTTP layer over these services.

pub mod archive;
pub mod campaign;
pub mod content_type;
pub mod error;
pub mod html;
pub mod line_tag;
pub mod pipeline;
pub mod registry;
pub mod tracking;
pub mod upload;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use campaign::{next_genre_prefix, CampaignService, DEFAULT_GENRES};
pub use error::PipelineError;
pub use line_tag::{LineTagService, DEFAULT_LINE_TAGS};
pub use pipeline::{AdminContext, ArchivePipeline, PipelineOptions};
pub use registry::SiteRegistry;
pub use tracking::TrackingService;
pub use upload::{upload_in_batches, PartialUploadWarning, UploadReport, UploadTask};
