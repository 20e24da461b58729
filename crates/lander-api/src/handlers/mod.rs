pub mod campaign_codes;
pub mod genres;
pub mod health;
pub mod line_tags;
pub mod public_site;
pub mod sites;
pub mod tracking;
