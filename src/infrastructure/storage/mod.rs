//! File-based credential storage

use async_trait::async_trait;
use std::path::PathBuf;

use crate::application::errors::StorageError;
use crate::domain::traits::{CredentialState, CredentialStore};

/// Multi-file auth state: one JSON file per state key under the auth
/// directory. The state itself stays opaque to the core.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<CredentialState, StorageError> {
        let mut state = CredentialState::default();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // First run: nothing persisted yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(state),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    state.entries.insert(key.to_string(), value);
                }
                Err(e) => {
                    tracing::warn!("Skipping corrupt credential file {}: {}", path.display(), e);
                }
            }
        }

        Ok(state)
    }

    async fn save(&self, state: &CredentialState) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        for (key, value) in &state.entries {
            let raw = serde_json::to_string(value)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            tokio::fs::write(self.dir.join(format!("{}.json", key)), raw).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("waru-auth-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn load_on_fresh_directory_is_empty() {
        let store = FileCredentialStore::new(temp_dir());
        let state = store.load().await.unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = FileCredentialStore::new(temp_dir());
        let mut state = CredentialState::default();
        state
            .entries
            .insert("creds".to_string(), serde_json::json!({"registered": true}));
        state
            .entries
            .insert("keys".to_string(), serde_json::json!([1, 2, 3]));

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn corrupt_files_are_skipped_not_fatal() {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("bad.json"), b"{oops").await.unwrap();
        tokio::fs::write(dir.join("good.json"), b"{\"x\":1}").await.unwrap();

        let store = FileCredentialStore::new(&dir);
        let state = store.load().await.unwrap();
        assert_eq!(state.entries.len(), 1);
        assert!(state.entries.contains_key("good"));
    }
}
