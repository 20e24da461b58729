use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Marketing channel that campaign codes are grouped under
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CodeGenre {
    pub id: i32,
    /// Three upper-case letters, unique (e.g. `AAA`)
    pub prefix: String,
    pub name: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Traffic attribution code owned by exactly one site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CampaignCode {
    pub id: Uuid,
    /// `{genre_prefix}-{suffix}`, unique
    pub code: String,
    pub site_id: Uuid,
    pub genre_id: i32,
    pub genre_prefix: String,
    pub genre_name: String,
    pub name: String,
    pub memo: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a campaign code
#[derive(Debug, Clone)]
pub struct NewCampaignCode {
    pub code: String,
    pub site_id: Uuid,
    pub genre_id: i32,
    pub name: String,
    pub memo: Option<String>,
    pub is_active: bool,
}

/// Partial update of a campaign code
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCampaignCodeRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Filter for listing campaign codes
#[derive(Debug, Clone, Copy, Default)]
pub struct CampaignCodeFilter {
    pub site_id: Option<Uuid>,
    pub genre_id: Option<i32>,
}

/// Request DTO for creating a campaign code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCampaignCodeRequest {
    pub site_number: i32,
    pub genre_id: i32,
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Result of looking a code up by its value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeLookupResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CampaignCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_name: Option<String>,
}

impl CodeLookupResponse {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            code: None,
            genre_prefix: None,
            genre_name: None,
        }
    }
}

impl From<CampaignCode> for CodeLookupResponse {
    fn from(code: CampaignCode) -> Self {
        Self {
            valid: true,
            genre_prefix: Some(code.genre_prefix.clone()),
            genre_name: Some(code.genre_name.clone()),
            code: Some(code),
        }
    }
}

/// Request DTO for creating or renaming a genre
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenreNameRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Genre name must be between 1 and 100 characters"
    ))]
    pub name: String,
}
