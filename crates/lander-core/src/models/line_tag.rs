use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Named LINE registration URL that admins pick as a site's CTA target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineTag {
    pub id: Uuid,
    /// `[a-z0-9_]{1,50}`, unique
    pub key: String,
    pub label: String,
    pub url: String,
    pub sort_order: i32,
    /// At most one tag carries the default flag
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a LINE tag
#[derive(Debug, Clone)]
pub struct NewLineTag {
    pub key: String,
    pub label: String,
    pub url: String,
    pub sort_order: i32,
    pub is_default: bool,
}

/// Request DTO for creating a LINE tag
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLineTagRequest {
    #[validate(length(min = 1, max = 50, message = "Key must be between 1 and 50 characters"))]
    pub key: String,
    #[validate(length(min = 1, max = 100, message = "Label must be between 1 and 100 characters"))]
    pub label: String,
    #[validate(length(min = 1, max = 2000, message = "URL must be between 1 and 2000 characters"))]
    pub url: String,
}

/// Partial update of a LINE tag
///
/// `is_default: Some(true)` moves the default flag onto this tag; `false`
/// is ignored since some tag always stays the default.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLineTagRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Key must be between 1 and 50 characters"))]
    pub key: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Label must be between 1 and 100 characters"))]
    pub label: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 2000, message = "URL must be between 1 and 2000 characters"))]
    pub url: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_limits() {
        let request = CreateLineTagRequest {
            key: "google".into(),
            label: "x".repeat(101),
            url: "https://liff.line.me/x".into(),
        };
        assert!(request.validate().is_err());

        let request = CreateLineTagRequest {
            key: "google".into(),
            label: "Google".into(),
            url: format!("https://liff.line.me/{}", "a".repeat(2000)),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_request_absent_fields_pass() {
        let request: UpdateLineTagRequest =
            serde_json::from_str(r#"{"is_default": true}"#).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.key.is_none());
    }
}
