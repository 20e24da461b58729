//! Database repositories for data access layer
//
// Site registry rows and the site-number high-water mark
pub mod site;
//
// Campaign codes and code genres
pub mod campaign;
//
// LINE registration URLs offered as CTA targets
pub mod line_tag;
//
// Beacons from the landing-page tracking script
pub mod tracking;
//
// Transaction utilities
pub mod transaction;

pub use campaign::{CampaignCodeRepository, CampaignStore};
pub use line_tag::{LineTagRepository, LineTagStore};
pub use site::{SiteRepository, SiteStore};
pub use tracking::{TrackingRepository, TrackingStore};
pub use transaction::TransactionGuard;
