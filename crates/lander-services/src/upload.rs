//! Batched asset uploads
//!
//! Files are uploaded in fixed-size batches; uploads within a batch run
//! concurrently and each batch finishes before the next starts. A failed file
//! is recorded and does not stop the run.

use futures::future::join_all;
use lander_storage::Storage;
use std::fmt;

/// One object to write
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub key: String,
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

/// Outcome of a batched upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub total: usize,
    /// Keys that failed to upload
    pub failures: Vec<String>,
}

impl UploadReport {
    pub fn succeeded(&self) -> usize {
        self.total - self.failures.len()
    }

    /// `Some` when at least one file failed
    pub fn warning(&self) -> Option<PartialUploadWarning> {
        if self.failures.is_empty() {
            None
        } else {
            Some(PartialUploadWarning {
                total: self.total,
                failed: self.failures.len(),
            })
        }
    }
}

/// Non-fatal: some files of a run could not be uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialUploadWarning {
    pub total: usize,
    pub failed: usize,
}

impl fmt::Display for PartialUploadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Some files failed to upload ({} files / {} failed)",
            self.total, self.failed
        )
    }
}

/// Upload every task, `batch_size` at a time
pub async fn upload_in_batches(
    storage: &dyn Storage,
    tasks: Vec<UploadTask>,
    batch_size: usize,
) -> UploadReport {
    let total = tasks.len();
    let mut failures = Vec::new();
    let mut tasks = tasks.into_iter().peekable();

    while tasks.peek().is_some() {
        let batch: Vec<UploadTask> = tasks.by_ref().take(batch_size.max(1)).collect();
        let results = join_all(batch.into_iter().map(|task| async move {
            let result = storage
                .upload_with_key(&task.key, task.data, task.content_type)
                .await;
            (task.key, result)
        }))
        .await;

        for (key, result) in results {
            if let Err(e) = result {
                tracing::warn!(error = %e, key = %key, "File upload failed");
                failures.push(key);
            }
        }
    }

    if failures.is_empty() {
        tracing::debug!(total, "All files uploaded");
    } else {
        tracing::warn!(total, failed = failures.len(), "Upload finished with failures");
    }

    UploadReport { total, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockStorage;

    fn task(key: &str) -> UploadTask {
        UploadTask {
            key: key.to_string(),
            data: key.as_bytes().to_vec(),
            content_type: "text/plain",
        }
    }

    #[tokio::test]
    async fn test_uploads_all_tasks_across_batches() {
        let storage = MockStorage::new("https://cdn.test/lp-assets");
        let tasks: Vec<UploadTask> = (0..23).map(|i| task(&format!("1/f{}.txt", i))).collect();

        let report = upload_in_batches(&storage, tasks, 10).await;

        assert_eq!(report.total, 23);
        assert_eq!(report.succeeded(), 23);
        assert!(report.warning().is_none());
        assert_eq!(storage.keys().len(), 23);
        assert_eq!(storage.content_type("1/f0.txt").as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_failed_file_does_not_stop_the_run() {
        let storage = MockStorage::new("https://cdn.test/lp-assets");
        storage.fail_uploads_for("1/bad.png");

        let report = upload_in_batches(
            &storage,
            vec![task("1/a.css"), task("1/bad.png"), task("1/b.js")],
            2,
        )
        .await;

        assert_eq!(report.failures, vec!["1/bad.png".to_string()]);
        assert!(storage.get("1/b.js").is_some());
        let warning = report.warning().unwrap();
        assert_eq!(warning.to_string(), "Some files failed to upload (3 files / 1 failed)");
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let storage = MockStorage::new("https://cdn.test/lp-assets");
        let report = upload_in_batches(&storage, Vec::new(), 10).await;
        assert_eq!(report, UploadReport::default());
    }
}
