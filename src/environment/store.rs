//! Keyed environment store with atomic file persistence.

use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

use crate::environment::types::{Environment, EnvironmentCreate, EnvironmentUpdate};

/// Errors raised while persisting the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write environments file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize environments: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Environments kept in memory, mirrored to a JSON array on disk.
///
/// Every mutation holds the lock across read, check, mutate and persist.
#[derive(Debug)]
pub struct EnvironmentStore {
    path: PathBuf,
    entries: Mutex<Vec<Environment>>,
}

impl EnvironmentStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store. An unreadable or corrupt file is
    /// logged and also yields an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str::<Vec<Environment>>(&text) {
                Ok(entries) => {
                    tracing::info!(path = %path.display(), count = entries.len(), "Loaded environments");
                    entries
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt environments file");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read environments file");
                Vec::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All environments in creation order.
    pub async fn list(&self) -> Vec<Environment> {
        self.entries.lock().await.clone()
    }

    /// Look up one environment.
    pub async fn get(&self, id: &str) -> Option<Environment> {
        self.entries.lock().await.iter().find(|e| e.id == id).cloned()
    }

    /// Create and persist a new environment.
    pub async fn create(&self, data: EnvironmentCreate) -> Result<Environment, StoreError> {
        let now = Utc::now();
        let env = Environment {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: data.name,
            base_url: data.base_url,
            auth: data.auth,
            verify_ssl: data.verify_ssl,
            created_at: now,
            updated_at: now,
        };

        let mut entries = self.entries.lock().await;
        entries.push(env.clone());
        if let Err(e) = self.persist(&entries).await {
            entries.pop();
            return Err(e);
        }
        Ok(env)
    }

    /// Apply a partial update. Returns `Ok(None)` if `id` is unknown.
    pub async fn update(
        &self,
        id: &str,
        data: EnvironmentUpdate,
    ) -> Result<Option<Environment>, StoreError> {
        let mut entries = self.entries.lock().await;
        let Some(index) = entries.iter().position(|e| e.id == id) else {
            return Ok(None);
        };

        let mut updated = entries[index].clone();
        if let Some(name) = data.name {
            updated.name = name;
        }
        if let Some(base_url) = data.base_url {
            updated.base_url = base_url;
        }
        if let Some(auth) = data.auth {
            updated.auth = auth;
        }
        if let Some(verify_ssl) = data.verify_ssl {
            updated.verify_ssl = verify_ssl;
        }
        updated.updated_at = Utc::now();

        let previous = std::mem::replace(&mut entries[index], updated.clone());
        if let Err(e) = self.persist(&entries).await {
            entries[index] = previous;
            return Err(e);
        }
        Ok(Some(updated))
    }

    /// Delete an environment. Returns `Ok(false)` if `id` is unknown.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        let Some(index) = entries.iter().position(|e| e.id == id) else {
            return Ok(false);
        };

        let removed = entries.remove(index);
        if let Err(e) = self.persist(&entries).await {
            entries.insert(index, removed);
            return Err(e);
        }
        Ok(true)
    }

    /// Write to `<file>.tmp`, then rename over the target.
    async fn persist(&self, entries: &[Environment]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let payload = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, payload).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
