//! Key-value backends the task collection is persisted into

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Result;

/// Durable string-to-string store, one value per key
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; absent keys are ignored
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<data_dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
}

impl FileBackend {
    /// Create a backend over `data_dir`.
    ///
    /// The directory is created on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        // Ensure parent directory exists
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process backend; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_backend_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("nested"));

        assert!(backend.get("tasks").await.unwrap().is_none());

        backend.set("tasks", "[]").await.unwrap();
        assert_eq!(backend.get("tasks").await.unwrap().as_deref(), Some("[]"));
        assert!(temp_dir.path().join("nested/tasks.json").exists());

        backend.remove("tasks").await.unwrap();
        assert!(backend.get("tasks").await.unwrap().is_none());

        // Removing again is fine
        backend.remove("tasks").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_backend_clones_share_entries() {
        let backend = MemoryBackend::new();
        let other = backend.clone();

        backend.set("tasks", "[1]").await.unwrap();
        assert_eq!(other.get("tasks").await.unwrap().as_deref(), Some("[1]"));

        other.remove("tasks").await.unwrap();
        assert!(backend.get("tasks").await.unwrap().is_none());
    }
}
