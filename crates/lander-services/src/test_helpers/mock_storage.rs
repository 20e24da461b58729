//! In-memory storage bucket

use async_trait::async_trait;
use lander_storage::{Storage, StorageBackend, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    files: HashMap<String, (Vec<u8>, String)>,
    failing_uploads: HashSet<String>,
    failing_downloads: HashSet<String>,
    fail_deletes: bool,
}

/// Bucket double with injectable per-key failures
#[derive(Clone)]
pub struct MockStorage {
    state: Arc<Mutex<State>>,
    base_url: String,
}

impl MockStorage {
    pub fn new(base_url: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Put an object directly, bypassing failure injection
    pub fn insert(&self, key: &str, data: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(key.to_string(), (data, "application/octet-stream".to_string()));
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(key)
            .map(|(data, _)| data.clone())
    }

    /// Stored object as text (for HTML assertions)
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|data| String::from_utf8_lossy(&data).into_owned())
    }

    /// Content type recorded by the last upload of `key`
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }

    /// Every stored key, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().unwrap().files.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn fail_uploads_for(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_uploads
            .insert(key.to_string());
    }

    pub fn fail_downloads_for(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_downloads
            .insert(key.to_string());
    }

    /// Make every delete fail from now on
    pub fn fail_deletes(&self) {
        self.state.lock().unwrap().fail_deletes = true;
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.failing_uploads.contains(storage_key) {
            return Err(StorageError::UploadFailed(format!(
                "simulated failure for {}",
                storage_key
            )));
        }
        state
            .files
            .insert(storage_key.to_string(), (data, content_type.to_string()));
        Ok(self.public_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let state = self.state.lock().unwrap();
        if state.failing_downloads.contains(storage_key) {
            return Err(StorageError::DownloadFailed(format!(
                "simulated failure for {}",
                storage_key
            )));
        }
        state
            .files
            .get(storage_key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes {
            return Err(StorageError::DeleteFailed(format!(
                "simulated failure for {}",
                storage_key
            )));
        }
        state.files.remove(storage_key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .files
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.state.lock().unwrap().files.contains_key(storage_key))
    }

    fn public_base_url(&self) -> String {
        self.base_url.clone()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
