//! Pipeline error taxonomy
//!
//! Every variant aborts `process_archive`. Per-file upload failures and
//! temporary-object cleanup failures are not errors: the former surface as a
//! `PartialUploadWarning` on the success result, the latter are only logged.

use lander_core::AppError;
use lander_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Caller is not an authenticated site administrator
    #[error("Administrator authentication required")]
    Authorization,

    /// Bad temporary key shape, missing name, oversized archive
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The temporary archive could not be retrieved
    #[error("Failed to download archive: {0}")]
    Download(#[source] StorageError),

    /// The archive is unreadable or has no `index.html`
    #[error("Invalid archive: {0}")]
    ArchiveStructure(String),

    /// Allocating the site number or writing the site row failed
    #[error("Site registry error: {0}")]
    Registry(#[from] AppError),
}

impl PipelineError {
    /// Stable machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Authorization => "authorization",
            PipelineError::Validation(_) => "validation",
            PipelineError::Download(_) => "download",
            PipelineError::ArchiveStructure(_) => "archive_structure",
            PipelineError::Registry(_) => "registry",
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Authorization => {
                AppError::Unauthorized("Administrator authentication required".to_string())
            }
            PipelineError::Validation(msg) => AppError::InvalidInput(msg),
            PipelineError::Download(err @ (StorageError::NotFound(_) | StorageError::InvalidKey(_))) => {
                AppError::BadRequest(format!("Failed to download archive: {}", err))
            }
            PipelineError::Download(err) => {
                AppError::StorageUnavailable(format!("Failed to download archive: {}", err))
            }
            PipelineError::ArchiveStructure(msg) => AppError::InvalidInput(msg),
            PipelineError::Registry(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lander_core::ErrorMetadata;

    #[test]
    fn test_pipeline_errors_map_to_client_errors() {
        let err: AppError = PipelineError::Authorization.into();
        assert_eq!(err.http_status_code(), 401);

        let err: AppError = PipelineError::Validation("Site name is required".into()).into();
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Site name is required");

        let err: AppError = PipelineError::ArchiveStructure("no index.html".into()).into();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_missing_archive_is_client_error_but_outage_is_retryable() {
        let err: AppError =
            PipelineError::Download(StorageError::NotFound("lp-temp/a.zip".into())).into();
        assert_eq!(err.http_status_code(), 400);
        assert!(!err.is_recoverable());

        let err: AppError =
            PipelineError::Download(StorageError::BackendError("connection reset".into())).into();
        assert_eq!(err.http_status_code(), 503);
        assert_eq!(err.error_code(), "STORAGE_UNAVAILABLE");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_registry_error_passes_through() {
        let err: AppError =
            PipelineError::Registry(AppError::Conflict("Site 3 already exists".into())).into();
        assert_eq!(err.http_status_code(), 409);
    }
}
