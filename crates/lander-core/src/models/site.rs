use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One landing-page deployment, keyed by its site number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LandingPage {
    pub id: Uuid,
    pub site_number: i32,
    pub name: String,
    pub has_analytics_tag: bool,
    pub has_tracking_script: bool,
    pub has_cta_marker: bool,
    pub storage_path: String,
    pub cta_url: Option<String>,
    pub is_hidden: bool,
    pub is_published: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage prefix owned by a site: `{site_number}/`
pub fn site_storage_path(site_number: i32) -> String {
    format!("{}/", site_number)
}

/// Tag presence flags recorded on a site after injection or a rescan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFlags {
    pub analytics_tag: bool,
    pub tracking_script: bool,
    pub cta_marker: bool,
}

/// Fields required to insert a new site row
#[derive(Debug, Clone)]
pub struct NewLandingPage {
    pub site_number: i32,
    pub name: String,
    pub flags: TagFlags,
    pub cta_url: Option<String>,
    pub sort_order: i32,
}

/// One entry of a bulk reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrderEntry {
    pub site_number: i32,
    pub order: i32,
}

/// Request DTO for running the archive pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessArchiveRequest {
    pub temp_key: String,
    #[serde(default)]
    pub name: String,
    /// Present in edit mode; absent to allocate a new site number
    #[serde(default)]
    pub site_number: Option<i32>,
}

/// Response DTO for a finished pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessArchiveResponse {
    pub success: bool,
    pub site_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Request DTO for updating mutable site fields
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSiteRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Site name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    /// Option<Option> distinguishes "leave unchanged" from "clear"
    #[serde(default, deserialize_with = "present_or_null")]
    pub cta_url: Option<Option<String>>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

/// Maps a present field (including `null`) to `Some`, leaving absence to `default`
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request DTO for a bulk reorder
#[derive(Debug, Deserialize)]
pub struct SetSortOrdersRequest {
    pub entries: Vec<SortOrderEntry>,
}

/// Request DTO for a tag rescan; `None` rescans every site
#[derive(Debug, Default, Deserialize)]
pub struct CheckTagsRequest {
    #[serde(default)]
    pub site_numbers: Option<Vec<i32>>,
}

/// Per-site outcome of a tag rescan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCheckResult {
    pub site_number: i32,
    pub name: String,
    pub checks: Option<TagFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request DTO for the HTML editor
#[derive(Debug, Deserialize)]
pub struct SaveHtmlRequest {
    pub html: String,
}

/// Response DTO for the HTML editor read
#[derive(Debug, Serialize, Deserialize)]
pub struct SiteHtmlResponse {
    pub site_number: i32,
    pub name: String,
    pub html: String,
}

/// Response DTO for the HTML editor save
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveHtmlResponse {
    pub success: bool,
    pub checks: TagFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
